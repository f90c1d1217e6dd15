//! Multi-strategy article extraction.
//!
//! The listing page and the articles behind it are rendered client-side
//! and not structurally stable, so every per-article lookup is a probe:
//! absent means "try the next strategy", never "fail the run". Only a
//! failure to load the listing page itself aborts the extraction call.

use crate::images::ImageStore;
use anyhow::{anyhow, Context, Result};
use prensa_drivers::session::BrowserSession;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Fixed settle delay after navigation; the page is not guaranteed to be
/// interactive the moment navigation completes.
const SETTLE_DELAY: Duration = Duration::from_secs(2);
/// Upper bound on waiting for an article heading to render.
const HEADING_WAIT: Duration = Duration::from_secs(10);
/// Lookahead window for the date-like digit check on article hrefs.
const DIGIT_WINDOW: usize = 20;
/// Primary discovery heuristic: headline anchors inside article containers.
const PRIMARY_LINK_SELECTOR: &str = "article h2 a, article h3 a";

/// One extracted article. Immutable once returned; `url` is unique within
/// a single extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title_source: String,
    pub body_source: String,
    pub image_url: Option<String>,
    pub image_local_path: Option<PathBuf>,
}

/// A discovered article link plus whatever title text the listing page
/// offered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    href: String,
    anchor_text: String,
}

/// Insertion-ordered, URL-deduplicated, bounded candidate collection.
struct CandidateSet {
    limit: usize,
    seen: HashSet<String>,
    items: Vec<Candidate>,
}

impl CandidateSet {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    /// Accept a candidate unless it is a duplicate or the set is full.
    fn push(&mut self, href: String, anchor_text: String) -> bool {
        if self.is_full() || !self.seen.insert(href.clone()) {
            return false;
        }
        self.items.push(Candidate { href, anchor_text });
        true
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn into_vec(self) -> Vec<Candidate> {
        self.items
    }
}

/// Extract up to `n` articles from `listing_url`, in order of first
/// appearance on the listing page, deduplicated by URL.
pub async fn extract_articles(
    session: &BrowserSession,
    listing_url: &str,
    n: usize,
    images: &ImageStore,
) -> Result<Vec<ArticleRecord>> {
    session
        .navigate(listing_url)
        .await
        .with_context(|| format!("loading listing page {listing_url}"))?;
    sleep(SETTLE_DELAY).await;

    let candidates = discover_candidates(session, listing_url, n).await?;
    info!(
        session = %session.name(),
        candidates = candidates.len(),
        requested = n,
        "extract.discovery_complete"
    );

    let mut records = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match extract_one(session, &candidate, images).await {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(url = %candidate.href, error = %err, "extract.article_failed");
            }
        }
    }
    Ok(records)
}

/// Scan the listing page for article links.
///
/// The structural selector is tried first; if it matches nothing, a
/// broader href-substring heuristic over all anchors takes over.
async fn discover_candidates(
    session: &BrowserSession,
    listing_url: &str,
    n: usize,
) -> Result<Vec<Candidate>> {
    let section = section_path(listing_url)?;

    let mut anchors = session.find_all(PRIMARY_LINK_SELECTOR).await.unwrap_or_default();
    if anchors.is_empty() {
        debug!(selector = PRIMARY_LINK_SELECTOR, "extract.primary_selector_empty");
        let fallback = format!("a[href*=\"{section}\"]");
        anchors = session.find_all(&fallback).await.unwrap_or_default();
    }

    let mut candidates = CandidateSet::new(n);
    for anchor in anchors {
        if candidates.is_full() {
            break;
        }
        let Some(href) = anchor.attr("href").await else {
            continue;
        };
        if !article_href_accepted(&href, &section) {
            continue;
        }

        // Anchor text first, then the accessible-label fallbacks.
        let mut text = anchor.text().await;
        if text.is_none() {
            text = anchor.attr("aria-label").await;
        }
        if text.is_none() {
            text = anchor.attr("title").await;
        }

        candidates.push(href, text.unwrap_or_default());
    }
    Ok(candidates.into_vec())
}

async fn extract_one(
    session: &BrowserSession,
    candidate: &Candidate,
    images: &ImageStore,
) -> Result<ArticleRecord> {
    session.navigate(&candidate.href).await?;
    // A missing heading is handled by the title fallback chain.
    session.wait_for("h1", HEADING_WAIT).await;
    sleep(SETTLE_DELAY).await;

    let title = extract_title(session, candidate).await;
    let body = extract_body(session).await;
    let (image_url, image_local_path) = extract_image(session, images).await;

    Ok(ArticleRecord {
        url: candidate.href.clone(),
        title_source: title,
        body_source: body,
        image_url,
        image_local_path,
    })
}

/// Title fallback chain: page heading, then the listing-page anchor text,
/// then page metadata with the site-name suffix stripped.
async fn extract_title(session: &BrowserSession, candidate: &Candidate) -> String {
    if let Some(heading) = session.text_of("h1").await {
        return heading;
    }
    if !candidate.anchor_text.is_empty() {
        return candidate.anchor_text.clone();
    }
    if let Some(meta_title) = session
        .attr_of(r#"meta[property="og:title"]"#, "content")
        .await
    {
        return strip_site_suffix(&meta_title);
    }
    String::new()
}

/// Body fallback chain: paragraphs inside the first `article` container,
/// else in the broader main-content container. Scoping to the first
/// container keeps related-story teaser blocks out of the body. Blank
/// paragraphs are dropped either way.
async fn extract_body(session: &BrowserSession) -> String {
    let mut paragraphs = session.texts_within("article", "p").await;
    if paragraphs.is_empty() {
        paragraphs = session.texts_of("main p").await;
    }
    paragraphs.join("\n\n")
}

/// Image fallback chain: social-preview meta tag, else the first figure
/// image in the article container. A download failure leaves the record
/// without a local path but keeps the URL.
async fn extract_image(
    session: &BrowserSession,
    images: &ImageStore,
) -> (Option<String>, Option<PathBuf>) {
    let mut image_url = session
        .attr_of(r#"meta[property="og:image"]"#, "content")
        .await;
    if image_url.is_none() {
        image_url = session.attr_of("article figure img", "src").await;
    }

    let local = match &image_url {
        Some(url) => images.fetch(url).await,
        None => None,
    };
    (image_url, local)
}

/// The section path of the listing page, e.g. `/opinion/`.
fn section_path(listing_url: &str) -> Result<String> {
    let url = Url::parse(listing_url).with_context(|| format!("invalid listing url {listing_url}"))?;
    let path = url.path();
    if path.is_empty() || path == "/" {
        return Err(anyhow!("listing url {listing_url} has no section path"));
    }
    Ok(path.to_string())
}

/// Accept an href only if the path segment following the section prefix
/// contains a digit within the first [`DIGIT_WINDOW`] characters. Section
/// index pages (`/opinion/editoriales/`) carry no date-like identifier and
/// are rejected.
fn article_href_accepted(href: &str, section: &str) -> bool {
    match href.split(section).nth(1) {
        Some(tail) => tail.chars().take(DIGIT_WINDOW).any(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Strip a trailing site-name suffix from a metadata title, delimited by a
/// pipe or a hyphen surrounded by spaces.
fn strip_site_suffix(title: &str) -> String {
    if let Some(index) = title.find('|') {
        return title[..index].trim().to_string();
    }
    if let Some(index) = title.find(" - ") {
        return title[..index].trim().to_string();
    }
    title.trim().to_string()
}
