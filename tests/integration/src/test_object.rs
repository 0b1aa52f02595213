//! Object retrieval integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::{ASSET_OBJECTS, TestServer, clip_bytes};

    fn header<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_should_get_every_object_under_prefix() {
        let server = TestServer::start().await;
        let client = server.client();

        for (key, data) in ASSET_OBJECTS {
            let path = key.strip_prefix("public").expect("fixture prefix");
            let resp = client
                .get(server.url("assets.test", &path.replace(' ', "%20")))
                .send()
                .await
                .expect("request");

            assert_eq!(resp.status(), StatusCode::OK, "{key}");
            assert_eq!(resp.text().await.expect("body"), *data);
        }

        let keys: Vec<String> = server
            .backends
            .assets
            .requests()
            .into_iter()
            .map(|r| r.key)
            .collect();
        let expected: Vec<String> = ASSET_OBJECTS.iter().map(|(k, _)| (*k).to_owned()).collect();
        assert_eq!(keys, expected);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_translate_object_metadata() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("assets.test", "/index.html"))
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/html"));
        assert_eq!(header(&resp, "content-length"), Some("14"));
        assert_eq!(header(&resp, "etag"), Some("\"14\""));
        assert_eq!(
            header(&resp, "last-modified"),
            Some("Fri, 01 Mar 2024 12:00:00 GMT")
        );
        assert_eq!(header(&resp, "cache-control"), Some("public, max-age=300"));
        assert_eq!(header(&resp, "access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn test_should_return_same_headers_for_head_without_body() {
        let server = TestServer::start().await;
        let client = server.client();
        let url = server.url("assets.test", "/css/site.css");

        let get = client.get(&url).send().await.expect("get");
        let head = client.head(&url).send().await.expect("head");

        assert_eq!(head.status(), StatusCode::OK);
        for name in [
            "content-type",
            "content-length",
            "etag",
            "last-modified",
            "cache-control",
            "access-control-allow-origin",
        ] {
            assert_eq!(header(&get, name), header(&head, name), "{name}");
        }
        assert!(head.bytes().await.expect("body").is_empty());
    }

    #[tokio::test]
    async fn test_should_stream_large_object_intact() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("media.test", "/clip.bin"))
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_length(), u64::try_from(crate::CLIP_LEN).ok());
        assert_eq!(resp.bytes().await.expect("body"), clip_bytes());
    }

    #[tokio::test]
    async fn test_should_use_raw_path_as_key_without_prefix() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("media.test", "/clip.bin"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);

        let request = &server.backends.media.requests()[0];
        assert_eq!(request.bucket, "media");
        assert_eq!(request.key, "clip.bin");
    }
}
