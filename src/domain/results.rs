//! Per-key outcomes of a batch write.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Created,
    Updated,
    Error,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub key: String,
    pub action: OperationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn created<K: Into<String>>(key: K) -> Self {
        Self { key: key.into(), action: OperationType::Created, error: None }
    }

    pub fn updated<K: Into<String>>(key: K) -> Self {
        Self { key: key.into(), action: OperationType::Updated, error: None }
    }

    pub fn error<K: Into<String>, E: ToString>(key: K, error: E) -> Self {
        Self { key: key.into(), action: OperationType::Error, error: Some(error.to_string()) }
    }

    pub fn is_error(&self) -> bool {
        self.action == OperationType::Error
    }
}

/// Results keyed by entry address.
pub type Results = HashMap<String, OperationResult>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json_shape() {
        let ok = serde_json::to_value(OperationResult::created("a/b")).unwrap();
        assert_eq!(ok, serde_json::json!({"key": "a/b", "action": "created"}));

        let failed = serde_json::to_value(OperationResult::error("a/c", "boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"key": "a/c", "action": "error", "error": "boom"}));
    }
}
