//! Entry and tracking records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path;

/// A single key/value configuration item.
///
/// `path` is the storage directory and `concat(path, key)` the address. Callers
/// may also put the whole address in `key` and leave `path` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_validator_name: Option<String>,
}

impl Entry {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self { key: key.into(), value: value.into(), ..Default::default() }
    }

    /// Places the entry under a directory path.
    pub fn with_path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn with_validator<N: Into<String>>(mut self, name: N) -> Self {
        self.type_validator_name = Some(name.into());
        self
    }

    /// The fully-qualified address of this entry.
    pub fn address(&self) -> String {
        path::concat(&self.path, &self.key)
    }

    /// The validator name, with an empty name treated as no validator.
    pub fn validator_name(&self) -> Option<&str> {
        self.type_validator_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    /// Rebuilds the entry with `path`/`key` derived from its address.
    pub fn normalized(&self) -> Self {
        let address = self.address();
        let (prefix, key) = path::split(&address);
        Self {
            path: prefix.to_string(),
            key: key.to_string(),
            value: self.value.clone(),
            secure: self.secure,
            type_validator_name: self.validator_name().map(str::to_string),
        }
    }
}

/// One history record for a successful plain-store write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub key: String,
    pub value: String,
    pub secure: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl Tracking {
    pub fn record(entry: &Entry, updated_by: &str) -> Self {
        Self {
            key: entry.address(),
            value: entry.value.clone(),
            secure: entry.secure,
            updated_at: Utc::now(),
            updated_by: updated_by.to_string(),
        }
    }
}
