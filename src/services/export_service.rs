//! # Entry Export
//!
//! Encodes every entry under a prefix into a downloadable document.
//!
//! | Format   | Shape                                                        |
//! |----------|--------------------------------------------------------------|
//! | `json`   | list of `{key, value, secure}`, key being the full address   |
//! | `yaml`   | same list as YAML                                            |
//! | `dotenv` | `NAME=value` lines                                           |
//! | `ecs`    | `{"environment": [{name, value}], "secrets": [{name, valueFrom}]}` |

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Entry, ExportFormat, ExportOptions, ExportResult, OperationContext};
use crate::errors::{NboxError, Result};
use crate::storage::EntryRepository;

/// Encodes a list of entries into one document format.
pub trait Exporter: Send + Sync {
    fn export(&self, entries: &[Entry]) -> Result<Vec<u8>>;
}

#[derive(Serialize)]
struct ExportedEntry<'a> {
    key: String,
    value: &'a str,
    secure: bool,
}

fn exported(entries: &[Entry]) -> Vec<ExportedEntry<'_>> {
    entries
        .iter()
        .map(|e| ExportedEntry { key: e.address(), value: &e.value, secure: e.secure })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, entries: &[Entry]) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&exported(entries))?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlExporter;

impl Exporter for YamlExporter {
    fn export(&self, entries: &[Entry]) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_string(&exported(entries))?.into_bytes())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DotenvExporter;

impl DotenvExporter {
    fn escape(value: &str) -> String {
        let needs_quotes =
            value.chars().any(|c| matches!(c, ' ' | '\t' | '\n' | '"' | '\'' | '#' | '$' | '\\'));
        if !needs_quotes {
            return value.to_string();
        }
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

impl Exporter for DotenvExporter {
    fn export(&self, entries: &[Entry]) -> Result<Vec<u8>> {
        let mut out = String::new();
        for entry in entries {
            out.push_str(&env_var_name(&entry.key));
            out.push('=');
            out.push_str(&Self::escape(&entry.value));
            out.push('\n');
        }
        Ok(out.into_bytes())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EcsTaskDefinitionExporter;

#[derive(Serialize)]
struct EcsEnvironment<'a> {
    name: String,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EcsSecret<'a> {
    name: String,
    value_from: &'a str,
}

#[derive(Serialize)]
struct EcsTaskDefinition<'a> {
    environment: Vec<EcsEnvironment<'a>>,
    secrets: Vec<EcsSecret<'a>>,
}

impl Exporter for EcsTaskDefinitionExporter {
    fn export(&self, entries: &[Entry]) -> Result<Vec<u8>> {
        let mut definition = EcsTaskDefinition { environment: Vec::new(), secrets: Vec::new() };
        for entry in entries {
            let name = env_var_name(&entry.key);
            if entry.secure {
                definition.secrets.push(EcsSecret { name, value_from: &entry.value });
            } else {
                definition.environment.push(EcsEnvironment { name, value: &entry.value });
            }
        }
        Ok(serde_json::to_vec_pretty(&definition)?)
    }
}

/// Upper-cases a key and maps `/ - .` and spaces to `_`, dropping anything
/// else outside `[A-Z0-9_]`.
pub fn env_var_name(key: &str) -> String {
    key.to_uppercase()
        .chars()
        .filter_map(|c| match c {
            '/' | '-' | '.' | ' ' => Some('_'),
            'A'..='Z' | '0'..='9' | '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Hex SHA-256 of `data`.
pub fn compute_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Yaml => Box::new(YamlExporter),
        ExportFormat::Dotenv => Box::new(DotenvExporter),
        ExportFormat::Ecs => Box::new(EcsTaskDefinitionExporter),
    }
}

#[derive(Debug, Clone)]
pub struct ExportService {
    entries: Arc<dyn EntryRepository>,
    instance_name: String,
}

impl ExportService {
    pub fn new(entries: Arc<dyn EntryRepository>, instance_name: impl Into<String>) -> Self {
        Self { entries, instance_name: instance_name.into() }
    }

    pub async fn export(&self, ctx: &OperationContext, options: ExportOptions) -> Result<ExportResult> {
        let format = options.format();
        info!(prefix = %options.prefix, format = %format, "Starting export");

        let entries = self.entries.list(ctx, &options.prefix).await?;
        if entries.is_empty() {
            warn!(prefix = %options.prefix, "No entries found for export");
            return Err(NboxError::not_found("Entries", options.prefix));
        }

        let content = exporter_for(format).export(&entries)?;
        let checksum = compute_sha256(&content);
        let result =
            ExportResult { entries: entries.len(), size: content.len(), content, checksum };

        info!(
            entries_count = result.entries,
            size_bytes = result.size,
            checksum = %result.checksum,
            "Export completed successfully"
        );
        Ok(result)
    }

    /// `<instance>-export-<prefix|all>-<timestamp><ext>`, with separators in
    /// the prefix replaced so the name stays a single path component.
    pub fn filename(&self, format: ExportFormat, prefix: &str) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let prefix = prefix.trim().trim_matches('/').replace('/', "-");
        let prefix = if prefix.is_empty() { "all".to_string() } else { prefix };
        format!("{}-export-{}-{}{}", self.instance_name, prefix, timestamp, format.file_extension())
    }
}
