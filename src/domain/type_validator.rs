//! # Type Validators
//!
//! Named rules constraining entry values. Five built-ins live in a static
//! table and carry dedicated checks; every other validator is a regular
//! expression that must match the whole value.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{NboxError, Result};

pub const STRING: &str = "string";
pub const NUMBER: &str = "number";
pub const JSON: &str = "json";
pub const URL_HTTPS: &str = "url-https";
pub const URL_HTTP: &str = "url-http";

/// Built-in validators keyed by name. Immutable for the life of the process.
static BUILT_IN_VALIDATORS: LazyLock<HashMap<&'static str, TypeValidator>> = LazyLock::new(|| {
    [
        (STRING, ".*"),
        (NUMBER, r"^-?\d+(\.\d+)?$"),
        (JSON, "json"),
        (URL_HTTPS, "^https://"),
        (URL_HTTP, "^http://"),
    ]
    .into_iter()
    .map(|(name, regex)| (name, TypeValidator::new(name, regex)))
    .collect()
});

/// Display order for listings.
const BUILT_IN_ORDER: [&str; 5] = [STRING, NUMBER, JSON, URL_HTTPS, URL_HTTP];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeValidator {
    pub name: String,
    pub regex: String,
}

impl TypeValidator {
    pub fn new<N: Into<String>, R: Into<String>>(name: N, regex: R) -> Self {
        Self { name: name.into(), regex: regex.into() }
    }

    pub fn is_built_in(&self) -> bool {
        is_built_in(&self.name)
    }

    /// Checks `value` against this validator.
    ///
    /// The error names the validator; callers add the entry key.
    pub fn validate_value(&self, value: &str) -> Result<()> {
        let valid = match self.name.as_str() {
            STRING => true,
            NUMBER => value.parse::<f64>().is_ok(),
            JSON => serde_json::from_str::<serde_json::Value>(value).is_ok(),
            URL_HTTPS => has_scheme_and_host(value, "https"),
            URL_HTTP => has_scheme_and_host(value, "http"),
            _ => full_match(&self.regex)?.is_match(value),
        };

        if valid {
            Ok(())
        } else {
            Err(NboxError::validation_field(
                format!("value does not match type validator '{}'", self.name),
                self.name.clone(),
            ))
        }
    }

    /// Ensures a custom regex compiles.
    pub fn compile(&self) -> Result<Regex> {
        full_match(&self.regex)
    }
}

pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_VALIDATORS.contains_key(name)
}

/// Looks up a built-in validator by exact name.
pub fn built_in(name: &str) -> Option<&'static TypeValidator> {
    BUILT_IN_VALIDATORS.get(name)
}

/// All built-in validators in a stable order.
pub fn built_ins() -> Vec<TypeValidator> {
    BUILT_IN_ORDER.iter().filter_map(|name| built_in(name)).cloned().collect()
}

fn full_match(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

fn has_scheme_and_host(value: &str, scheme: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => {
            parsed.scheme() == scheme && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
