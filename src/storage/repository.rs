//! # Store Contracts
//!
//! Async interfaces the pipelines consume. Implementations own their
//! concurrency; batch writes must return exactly one result per distinct
//! input address and never fail as a whole.

use async_trait::async_trait;

use crate::domain::{BoxTemplate, Entry, OperationContext, OperationType, Results, Tracking, TypeValidator};
use crate::errors::Result;

/// Plaintext entry store.
#[async_trait]
pub trait EntryRepository: Send + Sync + std::fmt::Debug {
    /// Writes every entry, reporting per-address outcomes.
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Results;

    /// Fetches one entry by address.
    async fn retrieve(&self, ctx: &OperationContext, key: &str) -> Result<Option<Entry>>;

    /// Entries under `prefix`. May return entries from deeper paths too;
    /// callers that need an exact directory filter by `path` themselves.
    async fn list(&self, ctx: &OperationContext, prefix: &str) -> Result<Vec<Entry>>;

    async fn delete(&self, ctx: &OperationContext, key: &str) -> Result<()>;

    /// Write history of one address, oldest first.
    async fn tracking(&self, ctx: &OperationContext, key: &str) -> Result<Vec<Tracking>>;
}

/// Box template store.
#[async_trait]
pub trait TemplateRepository: Send + Sync + std::fmt::Debug {
    async fn upsert_box(&self, ctx: &OperationContext, template: BoxTemplate) -> Result<OperationType>;

    async fn box_exists(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        name: &str,
    ) -> Result<bool>;

    /// Raw template bytes. A missing template is [`crate::errors::NboxError::NotFound`].
    async fn retrieve_box(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        name: &str,
    ) -> Result<Vec<u8>>;

    async fn list(&self, ctx: &OperationContext) -> Result<Vec<BoxTemplate>>;
}

/// Custom type validator directory.
#[async_trait]
pub trait TypeValidatorRepository: Send + Sync + std::fmt::Debug {
    /// `Ok(None)` when no validator has that name.
    async fn retrieve(&self, ctx: &OperationContext, name: &str) -> Result<Option<TypeValidator>>;

    async fn upsert(&self, ctx: &OperationContext, validator: TypeValidator) -> Result<OperationType>;

    async fn list(&self, ctx: &OperationContext) -> Result<Vec<TypeValidator>>;

    async fn delete(&self, ctx: &OperationContext, name: &str) -> Result<()>;
}
