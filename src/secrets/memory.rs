//! In-memory secret store modelled on a parameter store: secrets live under
//! a `/`-rooted name, carry a version, and values above 4 KiB move to the
//! advanced tier. Writes fan out per entry through [`scatter_gather`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::domain::{path, Entry, OperationContext, OperationType, Results};
use crate::errors::{NboxError, Result};
use crate::utils::{scatter_gather, DEFAULT_MAX_CONCURRENCY};

use super::store::SecretStore;
use super::types::SecretValue;

/// Largest value accepted by the standard tier.
pub const STANDARD_TIER_MAX_BYTES: usize = 4096;
/// Largest value accepted at all.
pub const ADVANCED_TIER_MAX_BYTES: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterTier {
    Standard,
    Advanced,
}

#[derive(Debug, Clone)]
struct SecretRecord {
    address: String,
    value: SecretValue,
    version: u64,
    tier: ParameterTier,
}

#[derive(Debug, Clone)]
pub struct InMemorySecretStore {
    secrets: Arc<DashMap<String, SecretRecord>>,
    max_concurrency: usize,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl InMemorySecretStore {
    pub fn new(max_concurrency: usize) -> Self {
        Self { secrets: Arc::new(DashMap::new()), max_concurrency }
    }

    /// Seeds the store; every seeded secret starts at version 1.
    pub fn with_entries<I: IntoIterator<Item = Entry>>(self, entries: I) -> Self {
        for entry in entries {
            let address = entry.address();
            let tier = tier_for(entry.value.len());
            let record =
                SecretRecord { address: address.clone(), value: SecretValue::new(entry.value), version: 1, tier };
            self.secrets.insert(parameter_name(&address), record);
        }
        self
    }

    /// Every secret with its plaintext value, sorted by address.
    pub fn snapshot(&self) -> Vec<Entry> {
        let mut all: Vec<Entry> = self.secrets.iter().map(|r| revealed(r.value())).collect();
        all.sort_by_key(Entry::address);
        all
    }

    pub fn version(&self, key: &str) -> Option<u64> {
        self.secrets.get(&parameter_name(key)).map(|r| r.version)
    }

    pub fn tier(&self, key: &str) -> Option<ParameterTier> {
        self.secrets.get(&parameter_name(key)).map(|r| r.tier)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Results {
        let items: Vec<(String, Entry)> = entries.into_iter().map(|e| (e.address(), e)).collect();
        let secrets = Arc::clone(&self.secrets);

        scatter_gather(ctx, "secret upsert", items, self.max_concurrency, move |entry: Entry| {
            let secrets = Arc::clone(&secrets);
            async move {
                let address = entry.address();
                let size = entry.value.len();
                if size > ADVANCED_TIER_MAX_BYTES {
                    return Err(NboxError::validation_field(
                        format!("secret value is {} bytes, limit is {}", size, ADVANCED_TIER_MAX_BYTES),
                        address,
                    ));
                }

                let tier = tier_for(size);
                let value = SecretValue::new(entry.value);
                let name = parameter_name(&address);
                let mut record = secrets.entry(name).or_insert_with(|| SecretRecord {
                    address: address.clone(),
                    value: SecretValue::default(),
                    version: 0,
                    tier,
                });
                record.value = value;
                record.tier = tier;
                record.version += 1;
                debug!(key = %address, version = record.version, tier = ?tier, "Stored secret");

                Ok(if record.version == 1 { OperationType::Created } else { OperationType::Updated })
            }
        })
        .await
    }

    async fn retrieve_value(&self, _ctx: &OperationContext, key: &str) -> Result<Option<Entry>> {
        Ok(self.secrets.get(&parameter_name(key)).map(|r| revealed(r.value())))
    }
}

fn parameter_name(address: &str) -> String {
    if address.starts_with(path::SEPARATOR) {
        address.to_string()
    } else {
        format!("{}{}", path::SEPARATOR, address)
    }
}

fn tier_for(size: usize) -> ParameterTier {
    if size > STANDARD_TIER_MAX_BYTES {
        ParameterTier::Advanced
    } else {
        ParameterTier::Standard
    }
}

fn revealed(record: &SecretRecord) -> Entry {
    let (prefix, key) = path::split(&record.address);
    Entry {
        path: prefix.to_string(),
        key: key.to_string(),
        value: record.value.expose_secret().to_string(),
        secure: true,
        type_validator_name: None,
    }
}
