//! Bounded fan-out of per-configuration session runs.
//!
//! One failed, panicked, or slow session never affects its siblings: each
//! target runs in its own task, panics are caught at the task boundary, and
//! every target produces a result row. Results arrive in completion order
//! and are keyed by configuration name, not input position.

use async_trait::async_trait;
use futures::FutureExt;
use prensa_common::{truncate_reason, SessionTarget};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Longest error text carried in a result row.
const RESULT_ERROR_MAX_CHARS: usize = 220;

/// Final verdict of one session run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Passed,
    Failed,
}

/// What a successful pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub article_count: usize,
    pub repeated_words: HashMap<String, usize>,
}

/// One row of the final report: the verdict for one configuration, plus
/// its outcome data or a truncated failure reason.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub config_name: String,
    pub status: SessionStatus,
    pub article_count: usize,
    pub repeated_words: HashMap<String, usize>,
    pub error: Option<String>,
}

impl SessionResult {
    fn passed(config_name: &str, outcome: SessionOutcome) -> Self {
        Self {
            config_name: config_name.to_string(),
            status: SessionStatus::Passed,
            article_count: outcome.article_count,
            repeated_words: outcome.repeated_words,
            error: None,
        }
    }

    fn failed(config_name: &str, reason: &str) -> Self {
        Self {
            config_name: config_name.to_string(),
            status: SessionStatus::Failed,
            article_count: 0,
            repeated_words: HashMap::new(),
            error: Some(truncate_reason(reason, RESULT_ERROR_MAX_CHARS)),
        }
    }
}

/// The work performed inside one provisioned-and-torn-down session.
///
/// Implementations own the full session lifecycle for one target; the
/// orchestrator only cares whether the run produced an outcome.
#[async_trait]
pub trait SessionPipeline: Send + Sync {
    async fn run(&self, target: &SessionTarget) -> anyhow::Result<SessionOutcome>;
}

/// Run the pipeline once per target with at most `max_workers` running
/// concurrently.
///
/// Always returns exactly one result per target, in completion order. An
/// error or panic inside one run becomes a `Failed` row for that target
/// and nothing else.
pub async fn run_all(
    pipeline: Arc<dyn SessionPipeline>,
    targets: &[SessionTarget],
    max_workers: usize,
) -> Vec<SessionResult> {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();

    for target in targets.iter().cloned() {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return SessionResult::failed(&target.name, "worker pool closed"),
            };
            info!(session = %target.name, "orchestrate.session_start");
            run_one(pipeline.as_ref(), &target).await
        });
    }

    let mut results = Vec::with_capacity(targets.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            // Panics are caught inside the task, so a join error only
            // happens on runtime shutdown; there is no target to key a
            // row by at this point.
            Err(err) => error!(error = %err, "orchestrate.join_failed"),
        }
    }
    results
}

async fn run_one(pipeline: &dyn SessionPipeline, target: &SessionTarget) -> SessionResult {
    match AssertUnwindSafe(pipeline.run(target)).catch_unwind().await {
        Ok(Ok(outcome)) => {
            info!(
                session = %target.name,
                articles = outcome.article_count,
                repeated = outcome.repeated_words.len(),
                "orchestrate.session_passed"
            );
            SessionResult::passed(&target.name, outcome)
        }
        Ok(Err(err)) => {
            warn!(session = %target.name, error = ?err, "orchestrate.session_failed");
            SessionResult::failed(&target.name, &format!("{err:#}"))
        }
        Err(panic) => {
            let reason = panic_message(panic);
            error!(session = %target.name, %reason, "orchestrate.session_panicked");
            SessionResult::failed(&target.name, &reason)
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("session task panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("session task panicked: {s}")
    } else {
        "session task panicked".to_string()
    }
}
