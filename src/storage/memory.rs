//! # In-Memory Stores
//!
//! Process-local implementations of the store contracts. Entry writes fan
//! out one task per entry through [`scatter_gather`]; reads are served
//! straight from the maps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{
    box_template, path, BoxTemplate, Entry, OperationContext, OperationType, Results, Tracking,
    TypeValidator,
};
use crate::errors::{NboxError, Result};
use crate::utils::{scatter_gather, DEFAULT_MAX_CONCURRENCY};

use super::repository::{EntryRepository, TemplateRepository, TypeValidatorRepository};

/// Entry store backed by concurrent maps, with per-address write history.
#[derive(Debug, Clone)]
pub struct InMemoryEntryRepository {
    entries: Arc<DashMap<String, Entry>>,
    history: Arc<DashMap<String, Vec<Tracking>>>,
    max_concurrency: usize,
}

impl Default for InMemoryEntryRepository {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl InMemoryEntryRepository {
    pub fn new(max_concurrency: usize) -> Self {
        Self { entries: Arc::new(DashMap::new()), history: Arc::new(DashMap::new()), max_concurrency }
    }

    /// Seeds the store without recording history.
    pub fn with_entries<I: IntoIterator<Item = Entry>>(self, entries: I) -> Self {
        for entry in entries {
            self.entries.insert(path::canonical(&entry.address()), entry);
        }
        self
    }

    /// Every stored entry, sorted by address.
    pub fn snapshot(&self) -> Vec<Entry> {
        let mut all: Vec<Entry> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(Entry::address);
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Results {
        let items: Vec<(String, Entry)> =
            entries.into_iter().map(|e| (e.address(), e.normalized())).collect();
        let store = Arc::clone(&self.entries);
        let history = Arc::clone(&self.history);
        let username = ctx.username().to_string();

        scatter_gather(ctx, "entry upsert", items, self.max_concurrency, move |entry: Entry| {
            let store = Arc::clone(&store);
            let history = Arc::clone(&history);
            let username = username.clone();
            async move {
                let address = path::canonical(&entry.address());
                let tracking = Tracking::record(&entry, &username);
                let action = match store.insert(address.clone(), entry) {
                    Some(_) => OperationType::Updated,
                    None => OperationType::Created,
                };
                history.entry(address).or_default().push(tracking);
                Ok::<_, NboxError>(action)
            }
        })
        .await
    }

    async fn retrieve(&self, _ctx: &OperationContext, key: &str) -> Result<Option<Entry>> {
        Ok(self.entries.get(&path::canonical(key)).map(|e| e.value().clone()))
    }

    async fn list(&self, ctx: &OperationContext, prefix: &str) -> Result<Vec<Entry>> {
        ctx.ensure_active("entry list")?;
        let prefix = prefix.trim();
        let mut found: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| e.value().path.trim().starts_with(prefix))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(Entry::address);
        debug!(prefix = %prefix, count = found.len(), "Listed entries");
        Ok(found)
    }

    async fn delete(&self, _ctx: &OperationContext, key: &str) -> Result<()> {
        match self.entries.remove(&path::canonical(key)) {
            Some(_) => {
                info!(key = %key, "Deleted entry");
                Ok(())
            }
            None => Err(NboxError::not_found("Entry", key)),
        }
    }

    async fn tracking(&self, _ctx: &OperationContext, key: &str) -> Result<Vec<Tracking>> {
        let history = self.history.get(&path::canonical(key));
        Ok(history.map(|h| h.value().clone()).unwrap_or_default())
    }
}

/// Template store keyed by `service/stage/name`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateRepository {
    templates: Arc<RwLock<HashMap<String, BoxTemplate>>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Vec<BoxTemplate> {
        let mut all: Vec<BoxTemplate> = self.templates.read().await.values().cloned().collect();
        all.sort_by_key(BoxTemplate::location);
        all
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn upsert_box(&self, _ctx: &OperationContext, template: BoxTemplate) -> Result<OperationType> {
        template.validate()?;
        let location = template.location();
        let previous = self.templates.write().await.insert(location.clone(), template);
        info!(template = %location, "Stored box template");
        Ok(if previous.is_some() { OperationType::Updated } else { OperationType::Created })
    }

    async fn box_exists(
        &self,
        _ctx: &OperationContext,
        service: &str,
        stage: &str,
        name: &str,
    ) -> Result<bool> {
        let location = box_template::location(service, stage, name);
        Ok(self.templates.read().await.contains_key(&location))
    }

    async fn retrieve_box(
        &self,
        _ctx: &OperationContext,
        service: &str,
        stage: &str,
        name: &str,
    ) -> Result<Vec<u8>> {
        let location = box_template::location(service, stage, name);
        self.templates
            .read()
            .await
            .get(&location)
            .map(|t| t.template.clone().into_bytes())
            .ok_or_else(|| NboxError::not_found("Template", location))
    }

    async fn list(&self, _ctx: &OperationContext) -> Result<Vec<BoxTemplate>> {
        Ok(self.snapshot().await)
    }
}

/// Custom validator directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeValidatorRepository {
    validators: Arc<RwLock<HashMap<String, TypeValidator>>>,
}

impl InMemoryTypeValidatorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Vec<TypeValidator> {
        let mut all: Vec<TypeValidator> = self.validators.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

#[async_trait]
impl TypeValidatorRepository for InMemoryTypeValidatorRepository {
    async fn retrieve(&self, _ctx: &OperationContext, name: &str) -> Result<Option<TypeValidator>> {
        Ok(self.validators.read().await.get(name).cloned())
    }

    async fn upsert(&self, _ctx: &OperationContext, validator: TypeValidator) -> Result<OperationType> {
        let previous = self.validators.write().await.insert(validator.name.clone(), validator);
        Ok(if previous.is_some() { OperationType::Updated } else { OperationType::Created })
    }

    async fn list(&self, _ctx: &OperationContext) -> Result<Vec<TypeValidator>> {
        Ok(self.snapshot().await)
    }

    async fn delete(&self, _ctx: &OperationContext, name: &str) -> Result<()> {
        match self.validators.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(NboxError::not_found("TypeValidator", name)),
        }
    }
}
