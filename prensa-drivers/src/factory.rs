//! Session provisioning against a remote hub or a local Chromedriver.

use crate::session::BrowserSession;
use anyhow::Result;
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use prensa_common::SessionTarget;
use serde_json::{json, Map, Value};
use tracing::info;
use webdriver::capabilities::Capabilities;

const DEFAULT_HUB_URL: &str = "https://hub-cloud.browserstack.com/wd/hub";
const DEFAULT_LOCAL_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Capability-addressed session factory. The provisioning backend is an
/// opaque collaborator: hand it a configuration record, get back a live,
/// navigable session handle.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn provision(&self, target: &SessionTarget) -> Result<BrowserSession>;
}

/// Build W3C capabilities for `target`, optionally embedding hub
/// credentials into `bstack:options`.
///
/// Credentials ride in the capability map rather than URL userinfo, which
/// WebDriver clients do not forward as basic auth.
pub fn capabilities_for(
    target: &SessionTarget,
    credentials: Option<(&str, &str)>,
) -> Capabilities {
    let mut caps = Capabilities::new();

    if let Some(browser) = &target.browser {
        caps.insert("browserName".to_string(), json!(browser));
        let version = target.browser_version.as_deref().unwrap_or("latest");
        caps.insert("browserVersion".to_string(), json!(version));
    }

    let mut bstack = Map::new();
    if let Some(os) = &target.os {
        bstack.insert("os".to_string(), json!(os));
    }
    if let Some(os_version) = &target.os_version {
        bstack.insert("osVersion".to_string(), json!(os_version));
    }
    if let Some(device) = &target.device {
        bstack.insert("deviceName".to_string(), json!(device));
        bstack.insert("realMobile".to_string(), json!(target.real_mobile));
    }
    bstack.insert("sessionName".to_string(), json!(target.name));
    if let Some((username, access_key)) = credentials {
        bstack.insert("userName".to_string(), json!(username));
        bstack.insert("accessKey".to_string(), json!(access_key));
    }
    caps.insert("bstack:options".to_string(), Value::Object(bstack));

    // Request source-language content. Non-Chromium targets ignore this.
    if chrome_like(target) {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "prefs": { "intl.accept_languages": target.locale } }),
        );
    }

    caps
}

fn chrome_like(target: &SessionTarget) -> bool {
    match &target.browser {
        Some(browser) => browser.eq_ignore_ascii_case("chrome"),
        // Real-device Android targets default to Chrome.
        None => target.device.is_some(),
    }
}

/// Provisions sessions on a BrowserStack-style remote hub.
pub struct BrowserStackFactory {
    hub_url: String,
    username: String,
    access_key: String,
}

impl BrowserStackFactory {
    pub fn new(username: String, access_key: String) -> Self {
        Self {
            hub_url: DEFAULT_HUB_URL.to_string(),
            username,
            access_key,
        }
    }

    pub fn with_hub_url(mut self, hub_url: String) -> Self {
        self.hub_url = hub_url;
        self
    }
}

#[async_trait]
impl SessionFactory for BrowserStackFactory {
    async fn provision(&self, target: &SessionTarget) -> Result<BrowserSession> {
        let caps = capabilities_for(target, Some((&self.username, &self.access_key)));
        info!(session = %target.name, "factory.provision.remote");
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.hub_url)
            .await?;
        Ok(BrowserSession::new(client, target.name.clone(), true))
    }
}

/// Provisions sessions against a locally running Chromedriver.
pub struct LocalChromeFactory {
    webdriver_url: String,
    headless: bool,
}

impl LocalChromeFactory {
    pub fn new(headless: bool) -> Self {
        Self {
            webdriver_url: DEFAULT_LOCAL_WEBDRIVER_URL.to_string(),
            headless,
        }
    }

    pub fn with_webdriver_url(mut self, url: String) -> Self {
        self.webdriver_url = url;
        self
    }
}

#[async_trait]
impl SessionFactory for LocalChromeFactory {
    async fn provision(&self, target: &SessionTarget) -> Result<BrowserSession> {
        let mut args = vec![json!("--disable-gpu"), json!("--window-size=1200,900")];
        if self.headless {
            args.push(json!("--headless=new"));
        }

        let mut caps = Capabilities::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "prefs": { "intl.accept_languages": target.locale },
            }),
        );

        info!(session = %target.name, url = %self.webdriver_url, "factory.provision.local");
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await?;
        Ok(BrowserSession::new(client, target.name.clone(), false))
    }
}
