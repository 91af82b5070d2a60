//! Output formatting for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

/// Render data as pretty JSON
pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
}

/// Render data as YAML
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    serde_yaml::to_string(data).context("Failed to serialize to YAML")
}

/// Render data in the named format
pub fn render<T: Serialize>(data: &T, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "json" => to_json(data),
        "yaml" => to_yaml(data),
        other => anyhow::bail!("Unsupported output format: '{}'. Use 'json' or 'yaml'.", other),
    }
}
