use anyhow::{anyhow, Result};
use clap::Parser;
use prensa_common::observability::{init_logging, LogConfig, LogFormat};
use prensa_common::SessionTarget;
use prensa_config::{PrensaConfig, PrensaConfigLoader};
use prensa_drivers::factory::{BrowserStackFactory, LocalChromeFactory, SessionFactory};
use prensa_runner::{run_all, ScrapePipeline, SessionResult, SessionStatus};
use prensa_translate::TranslateClient;
use prensa_web::ImageStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Scrape a Spanish-language opinion section across a browser matrix,
/// translate the headlines, and report repeated words per session.
#[derive(Parser, Debug)]
#[command(name = "prensa", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "prensa.yaml")]
    config: PathBuf,

    /// Run against a local Chromedriver instead of the remote hub.
    #[arg(long)]
    local: bool,

    /// Run the local browser without a window. Only meaningful with --local.
    #[arg(long)]
    headless: bool,

    /// Skip the translation stage entirely.
    #[arg(long)]
    no_translate: bool,

    /// Override the configured cap on concurrent sessions.
    #[arg(long)]
    workers: Option<usize>,

    /// Directory for downloaded article images.
    #[arg(long, default_value = "article_images")]
    images_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: PrensaConfig = PrensaConfigLoader::new().with_file(&cli.config).load()?;
    let format = std::env::var("PRENSA_LOG_FORMAT")
        .map(|raw| LogFormat::from_str_lossy(&raw))
        .unwrap_or(LogFormat::Text);
    init_logging(LogConfig {
        format,
        ..LogConfig::default()
    })?;

    let factory = build_factory(&cli, &cfg)?;
    let translator = build_translator(&cli, &cfg)?;
    let (source_lang, target_lang) = match &cfg.translator {
        Some(t) => (t.source_lang.clone(), t.target_lang.clone()),
        None => ("es".to_string(), "en".to_string()),
    };

    let targets = if cfg.sessions.is_empty() {
        default_matrix()
    } else {
        cfg.sessions.clone()
    };
    let workers = cli.workers.unwrap_or(cfg.max_workers);

    let pipeline = ScrapePipeline::new(
        factory,
        translator,
        ImageStore::new(&cli.images_dir),
        cfg.listing_url.clone(),
        cfg.article_count,
        source_lang,
        target_lang,
    );

    let results = run_all(Arc::new(pipeline), &targets, workers).await;
    print_report(&results);

    let failed = results
        .iter()
        .filter(|r| r.status == SessionStatus::Failed)
        .count();
    if failed > 0 {
        return Err(anyhow!("{failed} of {} sessions failed", results.len()));
    }
    Ok(())
}

fn build_factory(cli: &Cli, cfg: &PrensaConfig) -> Result<Arc<dyn SessionFactory>> {
    if cli.local {
        return Ok(Arc::new(LocalChromeFactory::new(cli.headless)));
    }
    let bs = cfg.browserstack.as_ref().ok_or_else(|| {
        anyhow!("no browserstack section in the config; add one or pass --local")
    })?;
    let mut factory = BrowserStackFactory::new(bs.username.clone(), bs.access_key.clone());
    if let Some(hub_url) = &bs.hub_url {
        factory = factory.with_hub_url(hub_url.clone());
    }
    Ok(Arc::new(factory))
}

fn build_translator(cli: &Cli, cfg: &PrensaConfig) -> Result<Option<TranslateClient>> {
    if cli.no_translate {
        return Ok(None);
    }
    match &cfg.translator {
        Some(translator_cfg) => Ok(Some(TranslateClient::new(translator_cfg)?)),
        None => {
            warn!("no translator section in the config; headlines stay untranslated");
            Ok(None)
        }
    }
}

/// The matrix used when the config file lists no sessions: three desktop
/// browsers and two real devices.
fn default_matrix() -> Vec<SessionTarget> {
    vec![
        SessionTarget::desktop("ElPais - Chrome / Windows 11", "Chrome", "Windows", "11"),
        SessionTarget::desktop("ElPais - Firefox / Windows 10", "Firefox", "Windows", "10"),
        SessionTarget::desktop("ElPais - Safari / macOS Sonoma", "Safari", "OS X", "Sonoma"),
        SessionTarget {
            name: "ElPais - iPhone 14".to_string(),
            browser: None,
            browser_version: None,
            os: None,
            os_version: Some("16".to_string()),
            device: Some("iPhone 14".to_string()),
            real_mobile: true,
            locale: "es".to_string(),
        },
        SessionTarget {
            name: "ElPais - Galaxy S23".to_string(),
            browser: None,
            browser_version: None,
            os: None,
            os_version: Some("13.0".to_string()),
            device: Some("Samsung Galaxy S23".to_string()),
            real_mobile: true,
            locale: "es".to_string(),
        },
    ]
}

fn print_report(results: &[SessionResult]) {
    println!();
    println!("session results");
    println!("---------------");
    for result in results {
        match result.status {
            SessionStatus::Passed => {
                let mut repeated: Vec<_> = result.repeated_words.iter().collect();
                repeated.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                let words = if repeated.is_empty() {
                    "none".to_string()
                } else {
                    repeated
                        .iter()
                        .map(|(word, count)| format!("{word} ({count})"))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!(
                    "  PASSED  {:<34} articles: {}  repeated words: {}",
                    result.config_name, result.article_count, words
                );
            }
            SessionStatus::Failed => {
                println!(
                    "  FAILED  {:<34} {}",
                    result.config_name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    println!();
}
