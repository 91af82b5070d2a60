//! Secret store contract and secret reference format.

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::domain::{path, Entry, OperationContext, Results};
use crate::errors::Result;

/// Backend for secure entries.
///
/// Implementations must return exactly one result per distinct input
/// address and must never log secret values.
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Results;

    /// The secure entry with its plaintext value revealed.
    async fn retrieve_value(&self, ctx: &OperationContext, key: &str) -> Result<Option<Entry>>;
}

/// Builds the reference that replaces a secure entry's value in the plain store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    region: String,
    account_id: String,
    short: bool,
}

impl SecretReference {
    pub fn short() -> Self {
        Self { region: String::new(), account_id: String::new(), short: true }
    }

    pub fn qualified<R: Into<String>, A: Into<String>>(region: R, account_id: A) -> Self {
        Self { region: region.into(), account_id: account_id.into(), short: false }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        if config.short_reference {
            Self::short()
        } else {
            Self::qualified(config.region.clone(), config.account_id.clone())
        }
    }

    /// `/key` in short mode, otherwise
    /// `arn:aws:ssm:<region>:<account>:parameter/<key>`.
    pub fn for_key(&self, key: &str) -> String {
        if self.short {
            if key.starts_with(path::SEPARATOR) {
                key.to_string()
            } else {
                format!("{}{}", path::SEPARATOR, key)
            }
        } else {
            format!(
                "arn:aws:ssm:{}:{}:parameter/{}",
                self.region,
                self.account_id,
                key.strip_prefix(path::SEPARATOR).unwrap_or(key)
            )
        }
    }
}
