//! Object serving integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{
        cleanup_prefix, ensure_bucket, http_client, proxy_url, put_object, query_digest,
        s3_client, test_prefix,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_object_with_metadata() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("serve");
        let key = format!("{prefix}/hello.html");

        put_object(
            &client,
            &bucket,
            &key,
            b"<p>hello</p>",
            Some("text/html"),
            &[("x-foo", "bar")],
        )
        .await;

        let resp = http_client()
            .get(proxy_url(&format!("/{key}")))
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers.get("content-type").unwrap(), "text/html");
        assert_eq!(headers.get("x-foo").unwrap(), "bar");
        assert_eq!(headers.get("x-cache-s3").unwrap(), "hit");
        assert!(headers.get("etag").is_some());
        assert!(headers.get("last-modified").is_some());

        let body = resp.bytes().await.expect("body");
        assert_eq!(body, Bytes::from_static(b"<p>hello</p>"));

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_index_document_for_directory() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("index");

        put_object(
            &client,
            &bucket,
            &format!("{prefix}/docs/index.html"),
            b"docs home",
            Some("text/html"),
            &[],
        )
        .await;

        let resp = http_client()
            .get(proxy_url(&format!("/{prefix}/docs/")))
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.bytes().await.expect("body").as_ref(), b"docs home");

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_query_variant_by_digest() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("query");

        put_object(
            &client,
            &bucket,
            &format!("{prefix}/page/{}", query_digest("a=1&b=2")),
            b"variant",
            Some("text/plain"),
            &[],
        )
        .await;

        let http = http_client();
        let resp = http
            .get(proxy_url(&format!("/{prefix}/page?a=1&b=2")))
            .send()
            .await
            .expect("proxy request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.bytes().await.expect("body").as_ref(), b"variant");

        let resp = http
            .get(proxy_url(&format!("/{prefix}/page?b=2&a=1")))
            .send()
            .await
            .expect("proxy request");
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_requested_range() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("range");
        let key = format!("{prefix}/data.txt");

        put_object(&client, &bucket, &key, b"0123456789", None, &[]).await;

        let resp = http_client()
            .get(proxy_url(&format!("/{key}")))
            .header("Range", "bytes=2-5")
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers().get("content-range").unwrap(), "bytes 2-5/10");
        assert_eq!(resp.bytes().await.expect("body").as_ref(), b"2345");

        cleanup_prefix(&client, &bucket, &prefix).await;
    }
}
