//! Parallel session orchestration.
//!
//! [`orchestrate::run_all`] fans a matrix of [`prensa_common::SessionTarget`]
//! configurations out over a bounded worker pool and collects exactly one
//! [`orchestrate::SessionResult`] per target, however that target's run
//! ended. [`pipeline::ScrapePipeline`] is the production pipeline: provision
//! a browser, extract articles, translate the headlines, analyze them, and
//! report the verdict back to the provisioning backend before teardown.

pub mod orchestrate;
pub mod pipeline;

pub use orchestrate::{run_all, SessionOutcome, SessionPipeline, SessionResult, SessionStatus};
pub use pipeline::ScrapePipeline;
