//! The production session pipeline: scrape, translate, analyze, report.

use crate::orchestrate::{SessionOutcome, SessionPipeline};
use anyhow::{Context, Result};
use async_trait::async_trait;
use prensa_common::text::analyze;
use prensa_common::SessionTarget;
use prensa_drivers::factory::SessionFactory;
use prensa_drivers::session::BrowserSession;
use prensa_translate::TranslateClient;
use prensa_web::{extract_articles, ImageStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the full article pipeline inside one provisioned browser session.
///
/// Teardown happens on every path: the session verdict is reported to the
/// provisioning backend and the browser is closed whether the stages
/// succeeded or not, and neither step can change the run's outcome.
pub struct ScrapePipeline {
    factory: Arc<dyn SessionFactory>,
    translator: Option<TranslateClient>,
    images: ImageStore,
    listing_url: String,
    article_count: usize,
    source_lang: String,
    target_lang: String,
}

impl ScrapePipeline {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        translator: Option<TranslateClient>,
        images: ImageStore,
        listing_url: String,
        article_count: usize,
        source_lang: String,
        target_lang: String,
    ) -> Self {
        Self {
            factory,
            translator,
            images,
            listing_url,
            article_count,
            source_lang,
            target_lang,
        }
    }

    async fn run_stages(&self, session: &BrowserSession) -> Result<SessionOutcome> {
        let articles = extract_articles(
            session,
            &self.listing_url,
            self.article_count,
            &self.images,
        )
        .await?;

        let titles: Vec<String> = articles.iter().map(|a| a.title_source.clone()).collect();
        let headlines = match &self.translator {
            Some(client) => {
                client
                    .translate_batch(&titles, &self.source_lang, &self.target_lang)
                    .await
            }
            // No translator configured: nothing crosses the language
            // boundary, so the analysis input is a row of blanks.
            None => vec![String::new(); titles.len()],
        };

        for (article, headline) in articles.iter().zip(&headlines) {
            info!(
                session = %session.name(),
                url = %article.url,
                title = %article.title_source,
                translated = %headline,
                body_chars = article.body_source.chars().count(),
                image = article.image_local_path.is_some(),
                "pipeline.article"
            );
        }

        let report = analyze(&headlines);
        Ok(SessionOutcome {
            article_count: articles.len(),
            repeated_words: report.repeated,
        })
    }
}

#[async_trait]
impl SessionPipeline for ScrapePipeline {
    async fn run(&self, target: &SessionTarget) -> Result<SessionOutcome> {
        let session = self
            .factory
            .provision(target)
            .await
            .with_context(|| format!("provisioning session for {}", target.name))?;

        let outcome = self.run_stages(&session).await;

        match &outcome {
            Ok(o) => {
                session
                    .mark_passed(&format!("extracted {} articles", o.article_count))
                    .await;
            }
            Err(err) => {
                session.mark_failed(&format!("{err:#}")).await;
            }
        }

        if let Err(err) = session.close().await {
            warn!(session = %target.name, error = %err, "pipeline.close_failed");
        }
        outcome
    }
}
