//! # Template Resolver
//!
//! Stateless scanning and substitution of `{{ path }}` placeholders in box
//! templates.
//!
//! A placeholder is `{{`, optional whitespace, a non-empty path containing no
//! braces, optional whitespace and `}}`. Anything else that looks like a
//! marker (unterminated, nested braces, empty) is plain text and is left
//! untouched by every operation here.
//!
//! Substitution is single pass: values inserted for one placeholder are never
//! scanned again, so a value that itself contains `{{ ... }}` text survives
//! verbatim.

pub mod tokens;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::path;

pub use tokens::substitute_tokens;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s](?:[^{}]*[^{}\s])?)\s*\}\}").expect("placeholder regex is valid")
});

/// A `{{ path }}` span found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The exact matched text, braces included.
    pub raw: String,
    /// The trimmed inner path.
    pub path: String,
}

impl Placeholder {
    pub fn prefix(&self) -> &str {
        path::prefix_of(&self.path)
    }
}

/// Every placeholder in order of appearance.
pub fn extract_placeholders(template: &str) -> Vec<Placeholder> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .filter_map(|caps| {
            let raw = caps.get(0)?.as_str().to_string();
            let path = caps.get(1)?.as_str().trim().to_string();
            Some(Placeholder { raw, path })
        })
        .collect()
}

/// Distinct prefixes referenced by the template's placeholders.
pub fn prefixes(template: &str) -> BTreeSet<String> {
    extract_placeholders(template).iter().map(|p| p.prefix().to_string()).collect()
}

/// Placeholder paths, deduplicated, in first-occurrence order.
pub fn variables(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_placeholders(template)
        .into_iter()
        .filter(|p| seen.insert(p.path.clone()))
        .map(|p| p.path)
        .collect()
}

/// Replaces each placeholder with its lookup value, or `""` when absent.
pub fn substitute(template: &str, lookup: &HashMap<String, String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures<'_>| {
            caps.get(1)
                .and_then(|m| lookup.get(m.as_str().trim()))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}
