//! Common test utilities for all integration tests.
//!
//! Provides in-memory store wiring and collaborator doubles that fail or
//! count calls.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nbox::domain::{
    BoxTemplate, Entry, OperationContext, OperationResult, OperationType, Results, TypeValidator,
};
use nbox::errors::{NboxError, Result};
use nbox::secrets::{InMemorySecretStore, SecretReference, SecretStore};
use nbox::services::{BoxService, EntryService};
use nbox::storage::{
    InMemoryEntryRepository, InMemoryTemplateRepository, InMemoryTypeValidatorRepository,
    TemplateRepository, TypeValidatorRepository,
};

/// Template from the reference box fixture.
pub const REFERENCE_TEMPLATE: &str = r#"{"service": ":service","ENV_1": "{{ widget-x/:stage/key }}", "ENV_2": "{{widget-x/development/debug}}", "GLOBAL_SERVICE": "{{widget-x/sentry}}", "domain": "{{private-domain}}", "version": "1", "missing":"{{missing}}"}"#;

/// Entries the reference template resolves against.
pub fn reference_entries() -> Vec<Entry> {
    vec![
        Entry::new("key", "key-test").with_path("widget-x/development"),
        Entry::new("debug", "false").with_path("widget-x/development"),
        Entry::new("sentry", "xxxxx12345").with_path("widget-x"),
        Entry::new("private-domain", "private.io").with_path(" "),
    ]
}

/// All stores behind one set of services.
pub struct TestStores {
    pub entries: InMemoryEntryRepository,
    pub secrets: InMemorySecretStore,
    pub validators: InMemoryTypeValidatorRepository,
    pub templates: InMemoryTemplateRepository,
}

impl TestStores {
    pub fn new() -> Self {
        Self {
            entries: InMemoryEntryRepository::default(),
            secrets: InMemorySecretStore::default(),
            validators: InMemoryTypeValidatorRepository::new(),
            templates: InMemoryTemplateRepository::new(),
        }
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = self.entries.with_entries(entries);
        self
    }

    pub async fn with_template(self, template: BoxTemplate) -> Self {
        self.templates.upsert_box(&OperationContext::new(), template).await.unwrap();
        self
    }

    pub async fn with_validator(self, validator: TypeValidator) -> Self {
        self.validators.upsert(&OperationContext::new(), validator).await.unwrap();
        self
    }

    pub fn entry_service(&self, reference: SecretReference) -> EntryService {
        EntryService::new(
            Arc::new(self.entries.clone()),
            Arc::new(self.secrets.clone()),
            Arc::new(self.validators.clone()),
            reference,
        )
    }

    pub fn box_service(&self) -> BoxService {
        BoxService::new(Arc::new(self.templates.clone()), Arc::new(self.entries.clone()))
    }
}

/// Secret store that rejects the listed addresses and stores the rest.
#[derive(Debug, Default)]
pub struct FlakySecretStore {
    pub inner: InMemorySecretStore,
    pub rejected: HashSet<String>,
}

impl FlakySecretStore {
    pub fn rejecting<I: IntoIterator<Item = &'static str>>(keys: I) -> Self {
        let rejected = keys.into_iter().map(String::from).collect();
        Self { inner: InMemorySecretStore::default(), rejected }
    }
}

#[async_trait]
impl SecretStore for FlakySecretStore {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Results {
        let (rejected, accepted): (Vec<Entry>, Vec<Entry>) =
            entries.into_iter().partition(|e| self.rejected.contains(&e.address()));

        let mut results = self.inner.upsert(ctx, accepted).await;
        for entry in rejected {
            let address = entry.address();
            let error = NboxError::storage("parameter store throttled the request");
            results.insert(address.clone(), OperationResult::error(address, error));
        }
        results
    }

    async fn retrieve_value(&self, ctx: &OperationContext, key: &str) -> Result<Option<Entry>> {
        self.inner.retrieve_value(ctx, key).await
    }
}

/// Validator directory that counts every call it receives.
#[derive(Debug, Default)]
pub struct CountingValidatorRepository {
    pub inner: InMemoryTypeValidatorRepository,
    pub calls: AtomicUsize,
}

impl CountingValidatorRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TypeValidatorRepository for CountingValidatorRepository {
    async fn retrieve(&self, ctx: &OperationContext, name: &str) -> Result<Option<TypeValidator>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.retrieve(ctx, name).await
    }

    async fn upsert(&self, ctx: &OperationContext, validator: TypeValidator) -> Result<OperationType> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(ctx, validator).await
    }

    async fn list(&self, ctx: &OperationContext) -> Result<Vec<TypeValidator>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(ctx).await
    }

    async fn delete(&self, ctx: &OperationContext, name: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(ctx, name).await
    }
}
