//! # Error Types
//!
//! Error types for the nbox store and its pipelines using `thiserror`.

/// Custom result type for nbox operations
pub type Result<T> = std::result::Result<T, NboxError>;

/// Main error type for nbox
#[derive(thiserror::Error, Debug)]
pub enum NboxError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Template parsing or decoding errors
    #[error("Template error: {message}")]
    Template { message: String },

    /// A box name whose extension maps to no known schema
    #[error("Unsupported schema for template '{template}'")]
    UnsupportedSchema { template: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Attempt to modify one of the immutable built-in type validators
    #[error("cannot {operation} built-in type validator '{name}'")]
    BuiltInValidator { operation: String, name: String },

    /// Storage collaborator failures
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Event delivery errors
    #[error("Publish error: {message}")]
    Publish { message: String },

    /// The caller cancelled the operation or its deadline passed
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NboxError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template { message: message.into() }
    }

    /// Create an unsupported schema error for a template name
    pub fn unsupported_schema<S: Into<String>>(template: S) -> Self {
        Self::UnsupportedSchema { template: template.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a new validation error for a specific field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a built-in validator modification error
    pub fn built_in_validator<O: Into<String>, N: Into<String>>(operation: O, name: N) -> Self {
        Self::BuiltInValidator { operation: operation.into(), name: name.into() }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into(), source: None }
    }

    /// Create a new storage error with source
    pub fn storage_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Storage { message: message.into(), source: Some(source) }
    }

    /// Create a new not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a new publish error
    pub fn publish<S: Into<String>>(message: S) -> Self {
        Self::Publish { message: message.into() }
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled { operation: operation.into() }
    }

    /// Create a new I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(context: S) -> Self {
        Self::Serialization { context: context.into(), source: None }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io { .. } | Self::Cancelled { .. })
    }

    /// Check if this error was caused by caller input rather than a collaborator
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::BuiltInValidator { .. }
                | Self::NotFound { .. }
                | Self::UnsupportedSchema { .. }
                | Self::Template { .. }
        )
    }
}

impl From<std::io::Error> for NboxError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for NboxError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            context: "JSON serialization failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<serde_yaml::Error> for NboxError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization {
            context: "YAML serialization failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<regex::Error> for NboxError {
    fn from(error: regex::Error) -> Self {
        Self::validation(format!("Invalid regex pattern: {}", error))
    }
}

impl From<validator::ValidationErrors> for NboxError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = NboxError::config("Invalid configuration");
        assert!(matches!(config_error, NboxError::Config { .. }));

        let validation_error = NboxError::validation_field("Invalid value", "value");
        assert!(matches!(validation_error, NboxError::Validation { field: Some(_), .. }));

        let not_found = NboxError::not_found("Template", "api/dev/app.json");
        assert_eq!(not_found.to_string(), "Resource not found: Template 'api/dev/app.json'");
    }

    #[test]
    fn test_built_in_validator_message() {
        let error = NboxError::built_in_validator("delete", "number");
        assert_eq!(error.to_string(), "cannot delete built-in type validator 'number'");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(NboxError::storage("throttled").is_retryable());
        assert!(NboxError::cancelled("upsert").is_retryable());
        assert!(!NboxError::validation("bad").is_retryable());
        assert!(!NboxError::unsupported_schema("x.toml").is_retryable());
    }

    #[test]
    fn test_client_errors() {
        assert!(NboxError::validation("bad").is_client_error());
        assert!(NboxError::template("bad bytes").is_client_error());
        assert!(!NboxError::storage("down").is_client_error());
        assert!(!NboxError::internal("oops").is_client_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: NboxError = json_error.into();
        assert!(matches!(error, NboxError::Serialization { .. }));
    }
}
