//! # Configuration Settings
//!
//! Defines the configuration structure for nbox.

use crate::errors::{NboxError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Store and secret reference configuration
    #[validate(nested)]
    pub store: StoreConfig,

    /// Event fan-out configuration
    #[validate(nested)]
    pub events: EventConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Build the whole configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            store: StoreConfig::from_env(),
            events: EventConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        // Use validator crate for basic validation
        Validate::validate(self).map_err(NboxError::from)?;

        // Custom validation logic
        self.validate_custom()?;

        Ok(())
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        let account_id = &self.store.account_id;
        if !account_id.is_empty()
            && (account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(NboxError::config("Account ID must be a 12 digit number"));
        }

        if !self.store.short_reference && account_id.is_empty() {
            return Err(NboxError::config(
                "Account ID is required when secret references are fully qualified",
            ));
        }

        for webhook_url in &self.events.webhook_urls {
            let parsed = url::Url::parse(webhook_url).map_err(|e| {
                NboxError::config_with_source(format!("Invalid webhook URL '{}'", webhook_url), Box::new(e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(NboxError::config(format!(
                    "Webhook URL '{}' must use http or https",
                    webhook_url
                )));
            }
        }

        Ok(())
    }
}

/// Store configuration: secret reference format and adapter fan-out
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Region embedded in fully qualified secret references
    #[validate(length(min = 1, message = "Region cannot be empty"))]
    pub region: String,

    /// Account embedded in fully qualified secret references
    pub account_id: String,

    /// Use `/key` references instead of fully qualified ones
    pub short_reference: bool,

    /// Upper bound on concurrent per-entry store operations
    #[validate(range(min = 1, max = 256, message = "Max concurrency must be between 1 and 256"))]
    pub max_concurrency: usize,

    /// How long custom validator lookups are cached (0 = no cache)
    #[validate(range(max = 3600, message = "Validator cache TTL must be <= 3600 seconds"))]
    pub validator_cache_ttl_seconds: u64,

    /// Instance name used in export file names
    #[validate(length(min = 1, message = "Instance name cannot be empty"))]
    pub instance_name: String,

    /// Namespace shared by every environment
    #[validate(length(min = 1, message = "Default prefix cannot be empty"))]
    pub default_prefix: String,

    /// Environment namespaces offered to clients, each ending in `/`
    pub allowed_prefixes: Vec<String>,
}

/// Environments offered when `NBOX_ALLOWED_PREFIXES` is unset.
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] =
    &["development/", "qa/", "beta/", "staging/", "sandbox/", "production/"];

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: String::new(),
            short_reference: true,
            max_concurrency: 16,
            validator_cache_ttl_seconds: 60,
            instance_name: "nbox".to_string(),
            default_prefix: "global".to_string(),
            allowed_prefixes: DEFAULT_ALLOWED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl StoreConfig {
    /// Create StoreConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let region = std::env::var("AWS_REGION")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.region);

        let account_id = std::env::var("ACCOUNT_ID").unwrap_or_default().trim().to_string();

        let short_reference = std::env::var("NBOX_PARAMETER_STORE_SHORT_ARN")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.short_reference);

        let max_concurrency = std::env::var("NBOX_MAX_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_concurrency);

        let validator_cache_ttl_seconds = std::env::var("NBOX_VALIDATOR_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.validator_cache_ttl_seconds);

        let instance_name = std::env::var("INSTANCE_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.instance_name);

        let default_prefix = std::env::var("NBOX_DEFAULT_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_prefix);

        let allowed_prefixes = std::env::var("NBOX_ALLOWED_PREFIXES")
            .map(|s| s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect())
            .unwrap_or(defaults.allowed_prefixes);

        Self {
            region,
            account_id,
            short_reference,
            max_concurrency,
            validator_cache_ttl_seconds,
            instance_name,
            default_prefix,
            allowed_prefixes,
        }
    }

    /// The default namespace followed by every allowed environment prefix.
    pub fn environments(&self) -> Vec<String> {
        let mut environments = vec![format!("{}/", self.default_prefix.trim_end_matches('/'))];
        environments.extend(self.allowed_prefixes.iter().cloned());
        environments
    }

    /// Get validator cache TTL as Duration (None if caching is disabled)
    pub fn validator_cache_ttl(&self) -> Option<Duration> {
        if self.validator_cache_ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.validator_cache_ttl_seconds))
        }
    }
}

/// Event fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventConfig {
    /// Webhook endpoints that receive every event
    pub webhook_urls: Vec<String>,

    /// Key used to sign webhook bodies
    #[serde(skip_serializing)]
    pub hmac_secret_key: Option<String>,

    /// In-process broadcast channel capacity
    #[validate(range(min = 1, max = 10000, message = "Broadcast capacity must be between 1 and 10000"))]
    pub broadcast_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { webhook_urls: Vec::new(), hmac_secret_key: None, broadcast_capacity: 100 }
    }
}

impl EventConfig {
    /// Create EventConfig from environment variables
    pub fn from_env() -> Self {
        let webhook_urls = std::env::var("NBOX_WEBHOOK_URLS")
            .map(|s| {
                s.split(',').map(str::trim).filter(|u| !u.is_empty()).map(str::to_string).collect()
            })
            .unwrap_or_default();

        let hmac_secret_key =
            std::env::var("NBOX_HMAC_SECRET_KEY").ok().filter(|s| !s.is_empty());

        let broadcast_capacity = std::env::var("NBOX_BROADCAST_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(100);

        Self { webhook_urls, hmac_secret_key, broadcast_capacity }
    }
}

/// Observability configuration for logging
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { service_name: "nbox".to_string(), log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let log_level = std::env::var("NBOX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let json_logging = std::env::var("NBOX_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let service_name =
            std::env::var("NBOX_SERVICE_NAME").unwrap_or_else(|_| "nbox".to_string());

        Self { service_name, log_level, json_logging }
    }
}
