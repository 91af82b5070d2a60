//! # nbox
//!
//! A configuration store for services: typed key/value entries addressed by
//! path, secrets kept behind references, and box templates rendered from
//! both.
//!
//! ## Architecture
//!
//! ```text
//! CLI → Services (box / entry / export / validators) → Store contracts
//!              ↓                                            ↓
//!        Event fan-out (broadcast, webhooks)     In-memory stores, secret store
//! ```
//!
//! ## Core Components
//!
//! - **Box pipeline**: token substitution, prefix lookups and single-pass
//!   placeholder substitution over stored templates
//! - **Entry pipeline**: validator immutability and value checks, secret
//!   writes with reference substitution, per-key results
//! - **Scatter-gather**: bounded concurrent per-entry writes joined by key
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use nbox::domain::{BoxTemplate, Entry, OperationContext};
//! use nbox::services::BoxService;
//! use nbox::storage::{InMemoryEntryRepository, InMemoryTemplateRepository, TemplateRepository};
//!
//! #[tokio::main]
//! async fn main() -> nbox::Result<()> {
//!     let ctx = OperationContext::new();
//!     let templates = Arc::new(InMemoryTemplateRepository::new());
//!     templates
//!         .upsert_box(&ctx, BoxTemplate::new("api", "prod", "env.json", r#"{"db": "{{ :service/db }}"}"#))
//!         .await?;
//!     let entries = InMemoryEntryRepository::default()
//!         .with_entries([Entry::new("db", "postgres://db").with_path("api")]);
//!
//!     let boxes = BoxService::new(templates, Arc::new(entries));
//!     let document = boxes.build_box(&ctx, "api", "prod", "env.json", &HashMap::new()).await?;
//!     println!("{}", document);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod services;
pub mod storage;
pub mod template;
pub mod utils;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{NboxError, Result};
pub use observability::init_logging;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
