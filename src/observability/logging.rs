//! # Structured Logging
//!
//! Subscriber setup and span macros for the tracing ecosystem.
//!
//! Secret values never appear in log fields; spans and events carry keys,
//! counts and transaction ids only.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ObservabilityConfig;
use crate::errors::{NboxError, Result};

/// Create a tracing span for one box build.
///
/// ```rust,ignore
/// let span = box_span!("widget-x", "development", "task_definition.json");
/// ```
#[macro_export]
macro_rules! box_span {
    ($service:expr, $stage:expr, $template:expr) => {
        tracing::info_span!(
            "build_box",
            service = %$service,
            stage = %$stage,
            template = %$template,
            build_id = %uuid::Uuid::new_v4()
        )
    };
    ($service:expr, $stage:expr, $template:expr, $($field:tt)*) => {
        tracing::info_span!(
            "build_box",
            service = %$service,
            stage = %$stage,
            template = %$template,
            build_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for an entry batch operation.
#[macro_export]
macro_rules! entry_span {
    ($operation:expr, $ctx:expr) => {
        tracing::info_span!(
            "entry_operation",
            operation = %$operation,
            transaction_id = %$ctx.transaction_id,
            username = %$ctx.username()
        )
    };
    ($operation:expr, $ctx:expr, $($field:tt)*) => {
        tracing::info_span!(
            "entry_operation",
            operation = %$operation,
            transaction_id = %$ctx.transaction_id,
            username = %$ctx.username(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Installing twice is
/// not an error, so tests and embedders may call this freely.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.log_level),
    }
    .map_err(|e| {
        NboxError::config_with_source(format!("Invalid log level '{}'", config.log_level), Box::new(e))
    })?;

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).json().with_current_span(true).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).finish(),
        )
    };

    if let Err(e) = installed {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        region = %config.store.region,
        short_reference = config.store.short_reference,
        max_concurrency = config.store.max_concurrency,
        webhooks = config.events.webhook_urls.len(),
        signed_webhooks = config.events.hmac_secret_key.is_some(),
        "nbox configuration"
    );
}
