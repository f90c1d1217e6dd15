use prensa_common::{PrensaError, TranslatorConfig};
use prensa_http::{HttpClient, HttpError, RequestOpts, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Known object fields carrying the translated string, tried in order.
const TRANSLATION_FIELDS: [&str; 5] = [
    "translated_text",
    "translatedText",
    "result",
    "translation",
    "translated",
];

/// Client for a RapidAPI-style translation endpoint.
#[derive(Debug)]
pub struct TranslateClient {
    http: HttpClient,
    headers: HeaderMap,
    pacing: Duration,
}

impl TranslateClient {
    /// Build a client from explicit configuration.
    ///
    /// Missing host or API key is a fatal configuration error, raised here
    /// before any network activity.
    pub fn new(config: &TranslatorConfig) -> prensa_common::Result<Self> {
        let host = config.host.trim();
        let api_key = config.api_key.trim();
        if host.is_empty() || api_key.is_empty() {
            return Err(PrensaError::Config(
                "translator host and api key are required (set RAPIDAPI_HOST and RAPIDAPI_KEY)"
                    .to_string(),
            ));
        }
        // An unresolved placeholder means the environment variable behind
        // it was never set; that's a missing credential, not a credential.
        if host.contains("${") || api_key.contains("${") {
            return Err(PrensaError::Config(
                "translator credentials contain unresolved ${VAR} placeholders".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(api_key).map_err(|_| {
                PrensaError::Config("translator api key contains invalid header bytes".to_string())
            })?,
        );
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(host).map_err(|_| {
                PrensaError::Config("translator host contains invalid header bytes".to_string())
            })?,
        );

        let policy = RetryPolicy::linear(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
        );
        let http = HttpClient::new(&format!("https://{host}"))
            .map_err(|e| PrensaError::Config(e.to_string()))?
            .with_retry_policy(policy);

        Ok(Self {
            http,
            headers,
            pacing: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Point the client at a different endpoint, e.g. a mock server in
    /// tests. Headers and policy carry over.
    pub fn with_base_url(mut self, base: &str) -> prensa_common::Result<Self> {
        let policy = self.http.retry;
        self.http = HttpClient::new(base)
            .map_err(|e| PrensaError::Config(e.to_string()))?
            .with_retry_policy(policy);
        Ok(self)
    }

    /// Translate one non-empty string. Rate-limit responses are retried by
    /// the underlying policy; any surviving error is returned.
    pub async fn translate(
        &self,
        text: &str,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<String, HttpError> {
        let body = json!({
            "from": from_lang,
            "to": to_lang,
            "e": "",
            "q": text,
        });
        let opts = RequestOpts {
            headers: Some(self.headers.clone()),
            ..Default::default()
        };
        let payload: Value = self.http.post_json("t", &body, opts).await?;
        Ok(parse_translation(&payload))
    }

    /// Translate a batch. The output has the same length and order as the
    /// input; empty inputs skip the backend entirely and per-element
    /// failures fall back to the original source text.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        from_lang: &str,
        to_lang: &str,
    ) -> Vec<String> {
        let mut out = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            if text.is_empty() {
                out.push(String::new());
            } else {
                match self.translate(text, from_lang, to_lang).await {
                    Ok(translated) => {
                        debug!(index, "translate.element.ok");
                        out.push(translated);
                    }
                    Err(err) => {
                        warn!(index, error = %err, "translate.element.failed, keeping source text");
                        out.push(text.clone());
                    }
                }
            }
            // Pace requests within the batch, but not after the final one.
            if index + 1 < texts.len() {
                sleep(self.pacing).await;
            }
        }
        out
    }
}

/// Pull the translated string out of whichever payload shape the backend
/// chose today. First structurally-valid match wins; the raw payload is
/// stringified as a last resort.
fn parse_translation(payload: &Value) -> String {
    if let Some(items) = payload.as_array() {
        if let Some(first) = items.first() {
            return value_to_text(first);
        }
    }

    if let Some(object) = payload.as_object() {
        for field in TRANSLATION_FIELDS {
            if let Some(value) = object.get(field) {
                return value_to_text(value);
            }
        }
        if let Some(translated) = payload
            .pointer("/data/translations/0/translatedText")
            .and_then(Value::as_str)
        {
            return translated.to_string();
        }
        if let Some(text) = object.get("text").and_then(Value::as_str) {
            return text.to_string();
        }
    }

    payload.to_string()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TranslatorConfig {
        TranslatorConfig {
            host: "translate.example.test".to_string(),
            api_key: "k".to_string(),
            source_lang: "es".to_string(),
            target_lang: "en".to_string(),
            request_delay_ms: 1,
            max_attempts: 3,
            backoff_base_ms: 1,
        }
    }

    #[test]
    fn missing_credentials_fail_at_construction() {
        let mut cfg = config();
        cfg.api_key = "  ".to_string();
        let err = TranslateClient::new(&cfg).expect_err("blank key must be rejected");
        assert!(matches!(err, PrensaError::Config(_)));

        cfg = config();
        cfg.host = String::new();
        assert!(TranslateClient::new(&cfg).is_err());
    }

    #[test]
    fn unresolved_placeholders_fail_at_construction() {
        let mut cfg = config();
        cfg.api_key = "${RAPIDAPI_KEY}".to_string();
        assert!(TranslateClient::new(&cfg).is_err());
    }

    #[test]
    fn valid_credentials_construct_a_client() {
        assert!(TranslateClient::new(&config()).is_ok());
    }

    #[test]
    fn parses_bare_array_payload() {
        assert_eq!(parse_translation(&json!(["The opinion"])), "The opinion");
    }

    #[test]
    fn parses_known_object_fields_in_order() {
        assert_eq!(
            parse_translation(&json!({"translated_text": "a", "result": "b"})),
            "a"
        );
        assert_eq!(parse_translation(&json!({"translatedText": "b"})), "b");
        assert_eq!(parse_translation(&json!({"translation": "c"})), "c");
    }

    #[test]
    fn parses_nested_translations_list() {
        let payload = json!({
            "data": { "translations": [ { "translatedText": "nested" } ] }
        });
        assert_eq!(parse_translation(&payload), "nested");
    }

    #[test]
    fn parses_plain_text_field() {
        assert_eq!(parse_translation(&json!({"text": "plain"})), "plain");
    }

    #[test]
    fn unknown_shapes_are_stringified() {
        let payload = json!({"surprise": true});
        assert_eq!(parse_translation(&payload), r#"{"surprise":true}"#);
    }

    #[test]
    fn non_string_array_heads_are_stringified() {
        assert_eq!(parse_translation(&json!([42, "x"])), "42");
    }
}
