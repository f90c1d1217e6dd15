//! WebDriver session layer for Prensa.
//!
//! Wraps `fantoccini` behind a [`session::BrowserSession`] handle and a
//! [`factory::SessionFactory`] seam so the pipeline can be provisioned
//! against a remote BrowserStack-style hub or a local Chromedriver without
//! caring which.

pub mod factory;
pub mod session;
