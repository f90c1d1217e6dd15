use std::sync::OnceLock;

use prensa_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "prensa-tests",
            emit_stderr: true,
            format: std::env::var("PRENSA_LOG_FORMAT")
                .map(|raw| LogFormat::from_str_lossy(&raw))
                .unwrap_or(LogFormat::Text),
            default_filter: "debug",
            ..LogConfig::default()
        };

        prensa_common::observability::init_logging(config).unwrap_or_default()
    });
}
