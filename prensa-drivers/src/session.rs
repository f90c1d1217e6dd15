//! Thin wrappers around a `fantoccini` WebDriver client and its elements.
//!
//! The probe helpers (`text_of`, `attr_of`, `texts_of`) absorb lookup
//! failures into `Option`/empty results: a missing selector or attribute is
//! "absent", never an error. Only navigation failures propagate.

use anyhow::Result;
use fantoccini::{elements::Element, Client, Locator};
use prensa_common::truncate_reason;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest failure reason forwarded to the provisioning backend.
const STATUS_REASON_MAX_CHARS: usize = 220;

/// One isolated browser-automation context bound to a single configuration.
pub struct BrowserSession {
    client: Client,
    name: String,
    remote: bool,
}

impl BrowserSession {
    pub fn new(client: Client, name: String, remote: bool) -> Self {
        Self {
            client,
            name,
            remote,
        }
    }

    /// Display name of the configuration this session runs for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Navigate to `url`. This is the one lookup-adjacent operation whose
    /// failure is surfaced to the caller.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(session = %self.name, %url, "session.navigate");
        self.client.goto(url).await?;
        Ok(())
    }

    /// Find zero or more elements by CSS selector.
    pub async fn find_all(&self, selector: &str) -> Result<Vec<SessionElement>> {
        let elements = self.client.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(SessionElement::new).collect())
    }

    /// Wait up to `timeout` for an element to appear. A timeout means
    /// "not ready", never "abort": the caller falls through to its next
    /// extraction stage.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        let found = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .is_ok();
        if !found {
            debug!(session = %self.name, selector, "session.wait_for.timeout");
        }
        found
    }

    /// Trimmed text of the first element matching `selector`, or `None`.
    pub async fn text_of(&self, selector: &str) -> Option<String> {
        let element = self.client.find(Locator::Css(selector)).await.ok()?;
        let text = element.text().await.ok()?;
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Attribute of the first element matching `selector`, or `None`.
    pub async fn attr_of(&self, selector: &str, attribute: &str) -> Option<String> {
        let element = self.client.find(Locator::Css(selector)).await.ok()?;
        let value = element.attr(attribute).await.ok()??;
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    /// Trimmed, non-empty texts of every element matching `selector`.
    /// Per-element failures are skipped.
    pub async fn texts_of(&self, selector: &str) -> Vec<String> {
        let Ok(elements) = self.client.find_all(Locator::Css(selector)).await else {
            return Vec::new();
        };
        collect_texts(elements).await
    }

    /// Like [`texts_of`](Self::texts_of), but scoped to the descendants of
    /// the *first* element matching `container`. A missing container yields
    /// an empty result.
    pub async fn texts_within(&self, container: &str, selector: &str) -> Vec<String> {
        let Ok(container) = self.client.find(Locator::Css(container)).await else {
            return Vec::new();
        };
        let Ok(elements) = container.find_all(Locator::Css(selector)).await else {
            return Vec::new();
        };
        collect_texts(elements).await
    }

    /// Run a script in the page. Used solely to report pass/fail status
    /// back to the provisioning backend.
    pub async fn execute(&self, script: &str) -> Result<serde_json::Value> {
        Ok(self.client.execute(script, vec![]).await?)
    }

    /// Report a passing run to the provisioning backend.
    pub async fn mark_passed(&self, reason: &str) {
        self.mark_status("passed", reason).await;
    }

    /// Report a failing run with a truncated reason.
    pub async fn mark_failed(&self, reason: &str) {
        self.mark_status("failed", reason).await;
    }

    async fn mark_status(&self, status: &str, reason: &str) {
        if !self.remote {
            return;
        }
        let payload = json!({
            "action": "setSessionStatus",
            "arguments": {
                "status": status,
                "reason": truncate_reason(reason, STATUS_REASON_MAX_CHARS),
            },
        });
        let script = format!("browserstack_executor: {payload}");
        // Status reporting is best effort; it must never replace the
        // session's real outcome.
        if let Err(err) = self.execute(&script).await {
            warn!(session = %self.name, %status, error = %err, "session.mark_status_failed");
        }
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        debug!(session = %self.name, "session.close");
        self.client.close().await?;
        Ok(())
    }
}

async fn collect_texts(elements: Vec<Element>) -> Vec<String> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        if let Ok(text) = element.text().await {
            let text = text.trim().to_string();
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    out
}

/// Wrapper for DOM elements with probe helpers consistent with
/// [`BrowserSession`].
pub struct SessionElement {
    element: Element,
}

impl SessionElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Trimmed visible text, `None` when empty or unreadable.
    pub async fn text(&self) -> Option<String> {
        let text = self.element.text().await.ok()?;
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Trimmed attribute value, `None` when absent, empty, or unreadable.
    pub async fn attr(&self, attribute: &str) -> Option<String> {
        let value = self.element.attr(attribute).await.ok()??;
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    }
}
