use std::time::Duration;

use prensa_http::{HttpClient, HttpError, RequestOpts, RetryPolicy};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, policy: RetryPolicy) -> HttpClient {
    HttpClient::new(&server.uri())
        .expect("mock server uri parses")
        .with_retry_policy(policy)
}

#[tokio::test]
async fn rate_limited_requests_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["hello"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::linear(3, Duration::from_millis(10)));
    let got: Value = client
        .post_json("t", &json!({"q": "hola"}), RequestOpts::default())
        .await
        .expect("third attempt succeeds");

    assert_eq!(got, json!(["hello"]));
}

#[tokio::test]
async fn retries_are_exhausted_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::linear(2, Duration::from_millis(5)));
    let err = client
        .post_json::<_, Value>("t", &json!({"q": "hola"}), RequestOpts::default())
        .await
        .expect_err("all attempts rate limited");

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn non_retryable_errors_fail_on_the_first_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::linear(3, Duration::from_millis(5)));
    let err = client
        .post_json::<_, Value>("t", &json!({"q": "hola"}), RequestOpts::default())
        .await
        .expect_err("server errors are not retried");

    match err {
        HttpError::Api { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}
