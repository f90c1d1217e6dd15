//! Common types and utilities shared across Prensa crates.
//!
//! This crate defines the session configuration record, observability
//! helpers, shared error types, and the pure text analysis functions used
//! throughout the Prensa workspace. It is intentionally lightweight so that
//! all crates can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`SessionTarget`]: One browser/OS/device configuration to run
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`text`]: Tokenizer and word-frequency analyzer
//! - [`PrensaError`] and [`Result`]: Shared error handling
use serde::{Deserialize, Serialize};

pub mod observability;
pub mod text;

fn default_locale() -> String {
    "es".to_string()
}

/// One browser/OS/device configuration for a single isolated session.
///
/// Desktop targets set `browser`/`os`; real-device targets set `device`
/// with `real_mobile`. `name` labels the remote session and the final
/// report, and `locale` is requested from the browser so the listing page
/// serves content in the source language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTarget {
    pub name: String,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub browser_version: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub real_mobile: bool,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl SessionTarget {
    /// Convenience constructor for a desktop browser target.
    pub fn desktop(name: &str, browser: &str, os: &str, os_version: &str) -> Self {
        Self {
            name: name.to_string(),
            browser: Some(browser.to_string()),
            browser_version: Some("latest".to_string()),
            os: Some(os.to_string()),
            os_version: Some(os_version.to_string()),
            device: None,
            real_mobile: false,
            locale: default_locale(),
        }
    }
}

fn default_source_lang() -> String {
    "es".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_max_attempts() -> usize {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

/// Credentials and pacing for the external translation backend.
///
/// `host` and `api_key` are required; both normally arrive through
/// `${RAPIDAPI_HOST}` / `${RAPIDAPI_KEY}` expansion in the config file.
/// The client constructor rejects a config with either missing before any
/// network activity happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    /// Fixed delay between successive requests within a batch.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Retry budget for rate-limited requests.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base of the linear backoff schedule (wait = attempt × base).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

/// Error types used across the Prensa system.
#[derive(thiserror::Error, Debug)]
pub enum PrensaError {
    /// Configuration was incomplete or invalid. The only error class that
    /// aborts the whole run, raised before any network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A browser session (provisioning, navigation) reported an error.
    #[error("Session error: {0}")]
    Session(#[from] anyhow::Error),

    /// The translation backend rejected or failed a request.
    #[error("Translation error: {0}")]
    Translate(String),
}

/// Convenient alias for results that use [`PrensaError`].
pub type Result<T> = std::result::Result<T, PrensaError>;

/// Truncate a failure reason for remote status reporting and report rows.
///
/// Char-boundary safe; appends an ellipsis marker when shortened.
pub fn truncate_reason(reason: &str, max_chars: usize) -> String {
    if reason.chars().count() <= max_chars {
        return reason.to_string();
    }
    let mut out: String = reason.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_reasons_alone() {
        assert_eq!(truncate_reason("boom", 220), "boom");
    }

    #[test]
    fn truncate_is_char_boundary_safe() {
        let long = "ñ".repeat(300);
        let cut = truncate_reason(&long, 220);
        assert_eq!(cut.chars().count(), 223);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn session_target_defaults_to_spanish_locale() {
        let t = SessionTarget::desktop("ElPais - Chrome Desktop", "chrome", "Windows", "11");
        assert_eq!(t.locale, "es");
        assert!(!t.real_mobile);
    }
}
