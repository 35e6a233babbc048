//! Input validation module.

mod domain;

pub use domain::validate_domain;
