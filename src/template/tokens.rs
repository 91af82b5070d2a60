//! Literal `:token` substitution applied to a raw template before any
//! placeholder is parsed.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::errors::{NboxError, Result};

pub const SERVICE_TOKEN: &str = ":service";
pub const STAGE_TOKEN: &str = ":stage";
pub const TEMPLATE_TOKEN: &str = ":template";

/// Replaces `:service`, `:stage`, `:template` and every `:<arg>` token.
///
/// Replacement is a single left-to-right pass. Where two tokens start at the
/// same position the longer one wins, so `:stage_name` is never split into
/// `:stage` + `_name`. Fixed tokens take precedence over args of the same name.
pub fn substitute_tokens(
    template: &str,
    service: &str,
    stage: &str,
    template_name: &str,
    args: &HashMap<String, String>,
) -> Result<String> {
    let mut replacements: HashMap<String, &str> = args
        .iter()
        .filter_map(|(key, value)| {
            let key = key.trim();
            (!key.is_empty()).then(|| (format!(":{}", key), value.as_str()))
        })
        .collect();
    replacements.insert(SERVICE_TOKEN.to_string(), service);
    replacements.insert(STAGE_TOKEN.to_string(), stage);
    replacements.insert(TEMPLATE_TOKEN.to_string(), template_name);

    let mut tokens: Vec<&String> = replacements.keys().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let pattern = tokens.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    let regex = Regex::new(&pattern)
        .map_err(|e| NboxError::template(format!("Invalid substitution arguments: {}", e)))?;

    Ok(regex
        .replace_all(template, |caps: &Captures<'_>| {
            caps.get(0)
                .and_then(|m| replacements.get(m.as_str()))
                .map(|value| value.to_string())
                .unwrap_or_default()
        })
        .into_owned())
}
