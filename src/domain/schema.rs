//! Output schema of a box, derived from its template name.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{NboxError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Json,
    Yaml,
    Txt,
}

impl SchemaType {
    /// Derives the schema from the template name's extension.
    pub fn from_template_name(name: &str) -> Result<Self> {
        let extension = Path::new(name.trim())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("txt") => Ok(Self::Txt),
            _ => Err(NboxError::unsupported_schema(name)),
        }
    }

    /// Renders an entry value for embedding in a document of this schema.
    ///
    /// JSON documents get the value as an escaped JSON string without its
    /// surrounding quotes, so it can sit inside an existing string literal.
    pub fn transform(&self, value: &str) -> Result<String> {
        match self {
            Self::Json => {
                let encoded = serde_json::to_string(value)?;
                let inner = encoded.strip_prefix('"').unwrap_or(&encoded);
                let inner = inner.strip_suffix('"').unwrap_or(inner);
                Ok(inner.to_string())
            }
            Self::Yaml | Self::Txt => Ok(value.to_string()),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Txt => write!(f, "txt"),
        }
    }
}
