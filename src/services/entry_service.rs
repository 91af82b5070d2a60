//! # Entry Pipeline
//!
//! Batch upsert of entries with per-key, partial-failure-tolerant results.
//!
//! For each distinct address in a batch:
//!
//! 1. an existing entry's type validator name must not change
//! 2. the requested validator is resolved, built-ins first
//! 3. the value is checked against it
//!
//! Entries passing all three are split by their `secure` flag. Secure entries
//! go to the [`SecretStore`]; each successful write continues to the plain
//! store with its value replaced by a [`SecretReference`]. A secure entry whose
//! secret write failed stops there. Plain entries go straight to the
//! [`EntryRepository`].
//!
//! The furthest stage a key reached decides its result, so every distinct
//! input address ends up with exactly one [`OperationResult`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn, Instrument};

use crate::domain::{
    type_validator, Entry, OperationContext, OperationResult, Tracking, TypeValidator,
};
use crate::errors::{NboxError, Result};
use crate::secrets::{SecretReference, SecretStore};
use crate::storage::{EntryRepository, TypeValidatorRepository};

/// The outward entry mutation surface.
///
/// Implemented by [`EntryService`] and by wrappers that add behaviour around
/// it, such as [`crate::services::NotifyingEntryService`].
#[async_trait]
pub trait EntryUseCase: Send + Sync {
    /// Writes a batch. Never fails as a whole; failures are per-key results.
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Vec<OperationResult>;

    async fn delete(&self, ctx: &OperationContext, key: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct EntryService {
    entries: Arc<dyn EntryRepository>,
    secrets: Arc<dyn SecretStore>,
    validators: Arc<dyn TypeValidatorRepository>,
    reference: SecretReference,
}

impl EntryService {
    pub fn new(
        entries: Arc<dyn EntryRepository>,
        secrets: Arc<dyn SecretStore>,
        validators: Arc<dyn TypeValidatorRepository>,
        reference: SecretReference,
    ) -> Self {
        Self { entries, secrets, validators, reference }
    }

    pub async fn retrieve(&self, ctx: &OperationContext, key: &str) -> Result<Entry> {
        self.entries.retrieve(ctx, key).await?.ok_or_else(|| NboxError::not_found("Entry", key))
    }

    pub async fn list(&self, ctx: &OperationContext, prefix: &str) -> Result<Vec<Entry>> {
        self.entries.list(ctx, prefix).await
    }

    pub async fn tracking(&self, ctx: &OperationContext, key: &str) -> Result<Vec<Tracking>> {
        self.entries.tracking(ctx, key).await
    }

    /// Plaintext of a secure entry.
    pub async fn reveal_secret(&self, ctx: &OperationContext, key: &str) -> Result<Entry> {
        self.secrets
            .retrieve_value(ctx, key)
            .await?
            .ok_or_else(|| NboxError::not_found("Secret", key))
    }

    /// Rejects an entry that fails the immutability, resolution or value checks.
    async fn check_entry(
        &self,
        ctx: &OperationContext,
        address: &str,
        entry: &Entry,
    ) -> Result<()> {
        let requested = entry.validator_name();

        let existing = self.entries.retrieve(ctx, address).await.map_err(|e| {
            NboxError::storage_with_source(
                format!("cannot verify type validator for existing key '{}'", address),
                Box::new(e),
            )
        })?;

        if let Some(existing) = existing {
            let current = existing.validator_name();
            if current != requested {
                return Err(NboxError::validation_field(
                    format!(
                        "cannot change type validator for existing key '{}' from '{}' to '{}'. \
                         Delete and recreate the entry to change type",
                        address,
                        current.unwrap_or_default(),
                        requested.unwrap_or_default()
                    ),
                    "type_validator_name",
                ));
            }
        }

        let Some(name) = requested else {
            return Ok(());
        };

        let validator = self.resolve_validator(ctx, name).await?;
        validator.validate_value(&entry.value).map_err(|e| {
            NboxError::validation_field(
                format!("validation failed for key '{}': {}", address, e),
                "value",
            )
        })
    }

    async fn resolve_validator(&self, ctx: &OperationContext, name: &str) -> Result<TypeValidator> {
        if let Some(built_in) = type_validator::built_in(name) {
            return Ok(built_in.clone());
        }

        match self.validators.retrieve(ctx, name).await {
            Ok(Some(validator)) => Ok(validator),
            Ok(None) => Err(NboxError::validation_field(
                format!("type validator '{}' not found", name),
                "type_validator_name",
            )),
            Err(e) => Err(NboxError::storage_with_source(
                format!("type validator '{}' lookup failed", name),
                Box::new(e),
            )),
        }
    }

    async fn run_upsert(
        &self,
        ctx: &OperationContext,
        entries: Vec<Entry>,
    ) -> Vec<OperationResult> {
        let batch = dedupe(entries);
        let mut results: HashMap<String, OperationResult> = HashMap::with_capacity(batch.len());
        let mut plain = Vec::new();
        let mut secure = Vec::new();

        for (address, entry) in batch {
            if let Err(e) = ctx.ensure_active("entry upsert") {
                results.insert(address.clone(), OperationResult::error(address, e));
                continue;
            }
            match self.check_entry(ctx, &address, &entry).await {
                Ok(()) if entry.secure => secure.push(entry),
                Ok(()) => plain.push(entry),
                Err(e) => {
                    warn!(key = %address, error = %e, "Entry rejected");
                    results.insert(address.clone(), OperationResult::error(address, e));
                }
            }
        }

        if !secure.is_empty() {
            let secret_results = self.secrets.upsert(ctx, secure.clone()).await;
            for mut entry in secure {
                let address = entry.address();
                match secret_results.get(&address) {
                    Some(result) if !result.is_error() => {
                        entry.value = self.reference.for_key(&address);
                        results.insert(address, result.clone());
                        plain.push(entry);
                    }
                    Some(result) => {
                        entry.value.clear();
                        results.insert(address, result.clone());
                    }
                    None => {
                        entry.value.clear();
                        let error = NboxError::storage("secret store returned no result");
                        results.insert(address.clone(), OperationResult::error(address, error));
                    }
                }
            }
        }

        if !plain.is_empty() {
            let forwarded: Vec<String> = plain.iter().map(Entry::address).collect();
            let mut plain_results = self.entries.upsert(ctx, plain).await;
            for address in forwarded {
                let result = plain_results.remove(&address).unwrap_or_else(|| {
                    OperationResult::error(
                        address.clone(),
                        NboxError::storage("entry store returned no result"),
                    )
                });
                results.insert(address, result);
            }
        }

        let failed = results.values().filter(|r| r.is_error()).count();
        info!(total = results.len(), failed = failed, "Entry batch processed");
        results.into_values().collect()
    }
}

#[async_trait]
impl EntryUseCase for EntryService {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Vec<OperationResult> {
        let span = crate::entry_span!("upsert", ctx, entries = entries.len());
        self.run_upsert(ctx, entries).instrument(span).await
    }

    async fn delete(&self, ctx: &OperationContext, key: &str) -> Result<()> {
        ctx.ensure_active("entry delete")?;
        self.entries.delete(ctx, key).await
    }
}

/// Collapses entries sharing an address; the last one wins, placed where the
/// address first appeared.
fn dedupe(entries: Vec<Entry>) -> Vec<(String, Entry)> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut batch: Vec<(String, Entry)> = Vec::with_capacity(entries.len());

    for entry in entries {
        let address = entry.address();
        match positions.get(&address) {
            Some(&index) => batch[index].1 = entry,
            None => {
                positions.insert(address.clone(), batch.len());
                batch.push((address, entry));
            }
        }
    }
    batch
}
