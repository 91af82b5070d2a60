//! Export formats, options and results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Yaml,
    Dotenv,
    Ecs,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json | Self::Ecs => "application/json",
            Self::Yaml => "application/x-yaml",
            Self::Dotenv => "text/plain",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Json | Self::Ecs => ".json",
            Self::Yaml => ".yaml",
            Self::Dotenv => ".env",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Dotenv => write!(f, "dotenv"),
            Self::Ecs => write!(f, "ecs"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = NboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "dotenv" | "env" => Ok(Self::Dotenv),
            "ecs" => Ok(Self::Ecs),
            other => Err(NboxError::validation_field(
                format!("unsupported export format '{}'", other),
                "format",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub prefix: String,
    pub format: Option<ExportFormat>,
}

impl ExportOptions {
    pub fn new<P: Into<String>>(prefix: P, format: ExportFormat) -> Self {
        Self { prefix: prefix.into(), format: Some(format) }
    }

    pub fn format(&self) -> ExportFormat {
        self.format.unwrap_or(ExportFormat::Json)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    pub entries: usize,
    pub content: Vec<u8>,
    pub size: usize,
    pub checksum: String,
}
