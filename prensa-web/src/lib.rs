//! Article extraction against a live browser session.
//!
//! [`extract::extract_articles`] discovers candidate article links on a
//! listing page and walks each one through ordered title/body/image
//! fallback chains. [`images::ImageStore`] is the local persistence
//! collaborator; its failures never surface into an article record.

pub mod extract;
pub mod images;

pub use extract::{extract_articles, ArticleRecord};
pub use images::ImageStore;
