use prensa_common::TranslatorConfig;
use prensa_translate::TranslateClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn test_config() -> TranslatorConfig {
    TranslatorConfig {
        host: "translate.example.test".to_string(),
        api_key: "test-key".to_string(),
        source_lang: "es".to_string(),
        target_lang: "en".to_string(),
        request_delay_ms: 1,
        max_attempts: 3,
        backoff_base_ms: 5,
    }
}

async fn client_against(server: &MockServer) -> TranslateClient {
    TranslateClient::new(&test_config())
        .expect("config is valid")
        .with_base_url(&server.uri())
        .expect("mock uri parses")
}

#[tokio::test]
async fn translates_and_sends_credential_headers() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/t"))
        .and(header("x-rapidapi-key", "test-key"))
        .and(header("x-rapidapi-host", "translate.example.test"))
        .and(body_partial_json(json!({"from": "es", "to": "en", "q": "hola"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["hello"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;
    let translated = client.translate("hola", "es", "en").await.unwrap();
    assert_eq!(translated, "hello");
}

#[tokio::test]
async fn rate_limited_translation_retries_then_succeeds() {
    common::init_test_tracing();
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
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"translatedText": "hello"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;
    let translated = client.translate("hola", "es", "en").await.unwrap();
    assert_eq!(translated, "hello");
}

#[tokio::test]
async fn batch_skips_empty_and_falls_back_on_failure() {
    let server = MockServer::start().await;
    // Every call fails outright; no retries apply to 500s.
    Mock::given(method("POST"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "down"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_against(&server).await;
    let out = client
        .translate_batch(&[String::new(), "hola".to_string()], "es", "en")
        .await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0], "");
    assert_eq!(out[1], "hola");
}

#[tokio::test]
async fn batch_preserves_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/t"))
        .and(body_partial_json(json!({"q": "uno"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["one"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/t"))
        .and(body_partial_json(json!({"q": "dos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["two"])))
        .mount(&server)
        .await;

    let client = client_against(&server).await;
    let out = client
        .translate_batch(
            &["uno".to_string(), String::new(), "dos".to_string()],
            "es",
            "en",
        )
        .await;

    assert_eq!(out, vec!["one".to_string(), String::new(), "two".to_string()]);
}
