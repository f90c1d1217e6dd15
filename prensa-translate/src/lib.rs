//! Rate-limit-aware client for the external translation backend.
//!
//! The backend is an opaque text-in/text-out service with one documented
//! failure mode: HTTP 429 when throttled. Single translations ride the
//! shared linear-backoff [`prensa_http::RetryPolicy`]; batches pace their
//! requests and degrade per element to the untranslated source text instead
//! of aborting.

mod client;

pub use client::TranslateClient;
