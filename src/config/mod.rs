//! # Configuration Management
//!
//! Environment-driven configuration for the store, the event fan-out and
//! logging. Every section has sensible defaults so the in-memory adapters run
//! without any environment at all.

pub mod settings;

pub use settings::{AppConfig, EventConfig, ObservabilityConfig, StoreConfig};
