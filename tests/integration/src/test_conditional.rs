//! Conditional request integration tests.

#[cfg(test)]
mod tests {
    use crate::{
        cleanup_prefix, ensure_bucket, http_client, proxy_url, put_object, s3_client, test_prefix,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_modified_for_matching_etag() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("etag");
        let key = format!("{prefix}/a.txt");

        put_object(&client, &bucket, &key, b"cached", Some("text/plain"), &[]).await;

        let http = http_client();
        let first = http
            .get(proxy_url(&format!("/{key}")))
            .send()
            .await
            .expect("proxy request");
        let etag = first.headers().get("etag").expect("etag header").clone();

        let resp = http
            .get(proxy_url(&format!("/{key}")))
            .header("If-None-Match", etag)
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_MODIFIED);
        assert!(resp.headers().get("x-cache-s3").is_none());
        assert!(resp.headers().get("content-type").is_none());

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_modified_since_last_modified() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("ims");
        let key = format!("{prefix}/a.txt");

        put_object(&client, &bucket, &key, b"cached", None, &[]).await;

        let http = http_client();
        let first = http
            .get(proxy_url(&format!("/{key}")))
            .send()
            .await
            .expect("proxy request");
        let last_modified = first
            .headers()
            .get("last-modified")
            .expect("last-modified header")
            .clone();

        let resp = http
            .get(proxy_url(&format!("/{key}")))
            .header("If-Modified-Since", last_modified)
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_MODIFIED);

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delegate_failed_precondition() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("ifmatch");
        let key = format!("{prefix}/a.txt");

        put_object(&client, &bucket, &key, b"cached", None, &[]).await;

        let resp = http_client()
            .get(proxy_url(&format!("/{key}")))
            .header("If-Match", "\"0000\"")
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        cleanup_prefix(&client, &bucket, &prefix).await;
    }
}
