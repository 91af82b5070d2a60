//! Local JSON state file backing the CLI.
//!
//! The file holds plain entries, secret plaintexts, templates and custom
//! validators. It is loaded into the in-memory stores at startup and written
//! back after a mutating command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::domain::{BoxTemplate, Entry, OperationContext, TypeValidator};
use crate::secrets::InMemorySecretStore;
use crate::storage::{
    InMemoryEntryRepository, InMemoryTemplateRepository, InMemoryTypeValidatorRepository,
    TemplateRepository, TypeValidatorRepository,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub secrets: Vec<Entry>,
    #[serde(default)]
    pub templates: Vec<BoxTemplate>,
    #[serde(default)]
    pub validators: Vec<TypeValidator>,
}

impl StateFile {
    /// Reads the state file. A missing file is an empty state.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }
}

/// The in-memory stores a CLI invocation runs against.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub entries: Arc<InMemoryEntryRepository>,
    pub secrets: Arc<InMemorySecretStore>,
    pub templates: Arc<InMemoryTemplateRepository>,
    pub validators: Arc<InMemoryTypeValidatorRepository>,
}

impl Workspace {
    pub async fn load(state: StateFile, config: &StoreConfig) -> Result<Self> {
        let ctx = OperationContext::new();
        let entries =
            InMemoryEntryRepository::new(config.max_concurrency).with_entries(state.entries);
        let secrets =
            InMemorySecretStore::new(config.max_concurrency).with_entries(state.secrets);

        let templates = InMemoryTemplateRepository::new();
        for template in state.templates {
            let location = template.location();
            templates
                .upsert_box(&ctx, template)
                .await
                .with_context(|| format!("Invalid template in state file: {}", location))?;
        }

        let validators = InMemoryTypeValidatorRepository::new();
        for validator in state.validators {
            let name = validator.name.clone();
            validators
                .upsert(&ctx, validator)
                .await
                .with_context(|| format!("Invalid type validator in state file: {}", name))?;
        }

        Ok(Self {
            entries: Arc::new(entries),
            secrets: Arc::new(secrets),
            templates: Arc::new(templates),
            validators: Arc::new(validators),
        })
    }

    pub async fn snapshot(&self) -> StateFile {
        StateFile {
            entries: self.entries.snapshot(),
            secrets: self.secrets.snapshot(),
            templates: self.templates.snapshot().await,
            validators: self.validators.snapshot().await,
        }
    }
}
