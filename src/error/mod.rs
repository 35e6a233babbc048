//! Error types for the site gate.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
