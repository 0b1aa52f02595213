//! Byte-range integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::RANGE;

    use crate::{CLIP_LEN, TestServer, clip_bytes};

    #[tokio::test]
    async fn test_should_forward_range_and_return_partial_content() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("media.test", "/clip.bin"))
            .header(RANGE, "bytes=0-99")
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
            Some(format!("bytes 0-99/{CLIP_LEN}").as_str())
        );
        assert_eq!(resp.bytes().await.expect("body"), clip_bytes().slice(0..100));

        let request = &server.backends.media.requests()[0];
        assert_eq!(request.range.as_deref(), Some("bytes=0-99"));
    }

    #[tokio::test]
    async fn test_should_serve_suffix_range() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("media.test", "/clip.bin"))
            .header(RANGE, "bytes=-10")
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.bytes().await.expect("body"),
            clip_bytes().slice(CLIP_LEN - 10..)
        );
    }

    #[tokio::test]
    async fn test_should_pass_malformed_range_to_backend_unchanged() {
        let server = TestServer::start().await;
        let resp = server
            .client()
            .get(server.url("media.test", "/clip.bin"))
            .header(RANGE, "items=1-2")
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let request = &server.backends.media.requests()[0];
        assert_eq!(request.range.as_deref(), Some("items=1-2"));
    }
}
