//! # Observability Infrastructure
//!
//! Structured logging for the nbox pipelines and adapters.

pub mod logging;

pub use logging::{init_logging, log_config_info};
