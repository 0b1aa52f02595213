//! Error response integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::TestServer;

    #[tokio::test]
    async fn test_should_return_not_found_for_missing_object() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("assets.test", "/missing.png"))
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(resp.text().await.expect("body"), "Not Found\n");
        assert_eq!(
            server.backends.assets.requests()[0].key,
            "public/missing.png"
        );
    }

    #[tokio::test]
    async fn test_should_hide_backend_failure_behind_not_found() {
        let server = TestServer::start().await;
        let client = server.client();

        let get = client
            .get(server.url("broken.test", "/anything"))
            .send()
            .await
            .expect("request");
        let head = client
            .head(server.url("broken.test", "/anything"))
            .send()
            .await
            .expect("request");

        assert_eq!(get.status(), StatusCode::NOT_FOUND);
        assert_eq!(head.status(), StatusCode::NOT_FOUND);
        assert!(get.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_should_serve_concurrent_requests_independently() {
        let server = TestServer::start().await;
        let client = server.client();

        let requests = (0..16).map(|i| {
            let client = client.clone();
            let url = if i % 2 == 0 {
                server.url("assets.test", "/index.html")
            } else {
                server.url("broken.test", "/index.html")
            };
            async move { client.get(url).send().await.map(|r| r.status()) }
        });
        let statuses = futures::future::join_all(requests).await;

        for (i, status) in statuses.into_iter().enumerate() {
            let expected = if i % 2 == 0 {
                StatusCode::OK
            } else {
                StatusCode::NOT_FOUND
            };
            assert_eq!(status.expect("request"), expected, "request {i}");
        }
    }
}
