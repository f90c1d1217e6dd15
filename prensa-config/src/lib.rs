//! Loader for the Prensa runtime configuration with YAML + environment
//! overlays.
//!
//! Precedence: `PRENSA_`-prefixed environment variables override file
//! values, and `${VAR}` placeholders inside any string value are expanded
//! recursively (depth-capped) after merging, which is how the
//! BrowserStack and translator credentials normally arrive.
use config::{Config, ConfigError, Environment, File};
use prensa_common::{SessionTarget, TranslatorConfig};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

fn default_listing_url() -> String {
    "https://elpais.com/opinion/".to_string()
}

fn default_article_count() -> usize {
    5
}

fn default_max_workers() -> usize {
    5
}

/// Top-level runtime configuration.
#[derive(Debug, Deserialize)]
pub struct PrensaConfig {
    pub version: Option<String>,
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Number of articles requested per session.
    #[serde(default = "default_article_count")]
    pub article_count: usize,
    /// Cap on concurrently running sessions.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub browserstack: Option<BrowserStackConfig>,
    #[serde(default)]
    pub translator: Option<TranslatorConfig>,
    /// One session per configuration in the matrix.
    #[serde(default)]
    pub sessions: Vec<SessionTarget>,
}

/// Credentials for the remote session provisioning hub.
#[derive(Debug, Deserialize)]
pub struct BrowserStackConfig {
    pub username: String,
    pub access_key: String,
    #[serde(default)]
    pub hub_url: Option<String>,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct PrensaConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PrensaConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PrensaConfigLoader {
    /// Start with the defaults: optional YAML file + `PRENSA_` env overrides.
    ///
    /// ```
    /// use prensa_config::PrensaConfigLoader;
    ///
    /// let cfg = PrensaConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.version.as_deref(), Some("1"));
    /// assert_eq!(cfg.article_count, 5);
    /// assert!(cfg.sessions.is_empty());
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("PRENSA").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers the format
    /// by suffix. The file may be absent so credential-only environments
    /// still work.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use prensa_config::PrensaConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_RAPID_KEY", "from-env"); }
    ///
    /// let cfg = PrensaConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// translator:
    ///   host: "rapid-translate.example"
    ///   api_key: "${DOCTEST_RAPID_KEY}"
    /// sessions:
    ///   - name: "ElPais - Chrome Desktop"
    ///     browser: "chrome"
    ///     os: "Windows"
    ///     os_version: "11"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// let translator = cfg.translator.expect("translator section");
    /// assert_eq!(translator.api_key, "from-env");
    /// assert_eq!(cfg.sessions[0].locale, "es");
    ///
    /// unsafe { std::env::remove_var("DOCTEST_RAPID_KEY"); }
    /// ```
    pub fn load(self) -> Result<PrensaConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Merge into a loose JSON tree first so `${VAR}` expansion can walk
        // every string, then materialise the typed config.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PrensaConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(typed)
    }
}
