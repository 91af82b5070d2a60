//! # Utilities
//!
//! Shared helpers used across adapters and services.

pub mod scatter;

use regex::Regex;

pub use scatter::{scatter_gather, DEFAULT_MAX_CONCURRENCY};

/// Regex for validating custom type validator and webhook names.
pub static VALID_NAME_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*$").expect("name regex is valid")
    });

/// Generate a new UUID v4 as a string
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(VALID_NAME_REGEX.is_match("semver"));
        assert!(VALID_NAME_REGEX.is_match("aws_account-id"));
        assert!(!VALID_NAME_REGEX.is_match("1st"));
        assert!(!VALID_NAME_REGEX.is_match("with space"));
        assert!(!VALID_NAME_REGEX.is_match(""));
    }

    #[test]
    fn test_generate_id() {
        assert_ne!(generate_id(), generate_id());
    }
}
