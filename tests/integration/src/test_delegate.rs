//! Delegation to the next handler.

#[cfg(test)]
mod tests {
    use crate::{
        cleanup_prefix, ensure_bucket, http_client, proxy_url, put_object, s3_client, test_prefix,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_found_for_missing_key() {
        let client = s3_client();
        ensure_bucket(&client).await;
        let prefix = test_prefix("missing");

        let resp = http_client()
            .get(proxy_url(&format!("/{prefix}/nope.css")))
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        assert!(resp.headers().get("x-cache-s3").is_none());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delegate_non_get_methods() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("method");
        let key = format!("{prefix}/a.txt");

        put_object(&client, &bucket, &key, b"present", None, &[]).await;

        let http = http_client();
        for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::HEAD] {
            let resp = http
                .request(method.clone(), proxy_url(&format!("/{key}")))
                .send()
                .await
                .expect("proxy request");
            assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{method}");
        }

        cleanup_prefix(&client, &bucket, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delegate_empty_object() {
        let client = s3_client();
        let bucket = ensure_bucket(&client).await;
        let prefix = test_prefix("empty");
        let key = format!("{prefix}/empty.txt");

        put_object(&client, &bucket, &key, b"", None, &[]).await;

        let resp = http_client()
            .get(proxy_url(&format!("/{key}")))
            .send()
            .await
            .expect("proxy request");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        cleanup_prefix(&client, &bucket, &prefix).await;
    }
}
