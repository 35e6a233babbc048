//! Configuration module for the site gate.
//!
//! Handles loading and validating gate settings from TOML files, and reading
//! the secret configuration store.

mod secrets;
mod settings;

pub use secrets::{ApiKey, SecretConfig, API_KEY};
pub use settings::*;
