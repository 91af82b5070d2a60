//! Stored box templates.

use serde::{Deserialize, Serialize};

use crate::errors::{NboxError, Result};

use super::path;

/// A named template owned by a service and stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxTemplate {
    pub service: String,
    pub stage: String,
    pub name: String,
    pub template: String,
}

impl BoxTemplate {
    pub fn new<S, T, N, B>(service: S, stage: T, name: N, template: B) -> Self
    where
        S: Into<String>,
        T: Into<String>,
        N: Into<String>,
        B: Into<String>,
    {
        Self { service: service.into(), stage: stage.into(), name: name.into(), template: template.into() }
    }

    /// Storage location of the template, `service/stage/name`.
    pub fn location(&self) -> String {
        location(&self.service, &self.stage, &self.name)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("service", &self.service), ("stage", &self.stage), ("name", &self.name)] {
            if value.trim().is_empty() {
                return Err(NboxError::validation_field(format!("{} cannot be empty", field), field));
            }
            if value.contains(path::SEPARATOR) {
                return Err(NboxError::validation_field(
                    format!("{} cannot contain '{}'", field, path::SEPARATOR),
                    field,
                ));
            }
        }
        Ok(())
    }
}

pub fn location(service: &str, stage: &str, name: &str) -> String {
    path::concat(&path::concat(service, stage), name)
}
