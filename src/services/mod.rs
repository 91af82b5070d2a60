//! Business logic services
//!
//! This module contains the pipelines and use cases built on top of the store
//! contracts, separated from the CLI and from any concrete backend.

pub mod box_service;
pub mod entry_service;
pub mod event_service;
pub mod export_service;
pub mod type_validator_service;
pub mod webhook_service;

pub use box_service::BoxService;
pub use entry_service::{EntryService, EntryUseCase};
pub use event_service::{
    BroadcastEventPublisher, EventDispatcher, EventPublisher, NotifyingEntryService,
};
pub use export_service::{env_var_name, ExportService, Exporter};
pub use type_validator_service::TypeValidatorService;
pub use webhook_service::WebhookEventPublisher;
