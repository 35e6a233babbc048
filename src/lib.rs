//! Site Gate Library
//!
//! Authentication cores for hosted sites: a shared-token guard that puts a
//! whole staging site behind a cookie-persisted access token, and an
//! HMAC-SHA256 request verifier with a replay window for signed API calls.

pub mod audit;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod http;
pub mod signing;
pub mod validation;

pub use gate::SiteGate;
