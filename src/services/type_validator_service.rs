//! Custom type validator management.
//!
//! Built-in validators are immutable: attempts to create, update or delete one
//! are rejected here without touching the repository.

use std::sync::Arc;

use tracing::info;

use crate::domain::{type_validator, OperationContext, OperationType, TypeValidator};
use crate::errors::{NboxError, Result};
use crate::storage::TypeValidatorRepository;
use crate::utils::VALID_NAME_REGEX;

#[derive(Debug, Clone)]
pub struct TypeValidatorService {
    repository: Arc<dyn TypeValidatorRepository>,
}

impl TypeValidatorService {
    pub fn new(repository: Arc<dyn TypeValidatorRepository>) -> Self {
        Self { repository }
    }

    pub async fn upsert(
        &self,
        ctx: &OperationContext,
        validator: TypeValidator,
    ) -> Result<OperationType> {
        let name = validator.name.trim().to_string();
        if type_validator::is_built_in(&name) {
            return Err(NboxError::built_in_validator("modify", name));
        }
        if !VALID_NAME_REGEX.is_match(&name) {
            return Err(NboxError::validation_field(
                format!("invalid type validator name '{}'", name),
                "name",
            ));
        }
        if validator.regex.is_empty() {
            return Err(NboxError::validation_field("regex cannot be empty", "regex"));
        }
        validator.compile()?;

        let stored = TypeValidator::new(name.clone(), validator.regex);
        let action = self.repository.upsert(ctx, stored).await?;
        info!(validator = %name, action = %action, "Stored type validator");
        Ok(action)
    }

    pub async fn delete(&self, ctx: &OperationContext, name: &str) -> Result<()> {
        let name = name.trim();
        if type_validator::is_built_in(name) {
            return Err(NboxError::built_in_validator("delete", name));
        }
        self.repository.delete(ctx, name).await?;
        info!(validator = %name, "Deleted type validator");
        Ok(())
    }

    pub async fn retrieve(&self, ctx: &OperationContext, name: &str) -> Result<TypeValidator> {
        if let Some(built_in) = type_validator::built_in(name) {
            return Ok(built_in.clone());
        }
        self.repository
            .retrieve(ctx, name)
            .await?
            .ok_or_else(|| NboxError::not_found("TypeValidator", name))
    }

    /// Built-ins first, then custom validators.
    pub async fn list(&self, ctx: &OperationContext) -> Result<Vec<TypeValidator>> {
        let mut all = type_validator::built_ins();
        all.extend(self.repository.list(ctx).await?);
        Ok(all)
    }
}
