//! Domain layer
//!
//! Pure data types and rules of the store with no storage dependencies:
//! entries and their addresses, type validators, box templates, per-key
//! results, events and export descriptors.
//!
//! ## Module Organization
//!
//! - `path`: slash-delimited path algebra shared by both pipelines
//! - `entry`: entries and their tracking history
//! - `type_validator`: built-in and custom value validators
//! - `schema`: output schema of a box and value embedding rules
//! - `results`: per-key outcomes of a batch write
//! - `context`: per-call transaction id, user, cancellation and deadline
//! - `box_template`, `event`, `export`: records exchanged with collaborators

pub mod box_template;
pub mod context;
pub mod entry;
pub mod event;
pub mod export;
pub mod path;
pub mod results;
pub mod schema;
pub mod type_validator;

pub use box_template::BoxTemplate;
pub use context::OperationContext;
pub use entry::{Entry, Tracking};
pub use event::{Event, EventType, Webhook};
pub use export::{ExportFormat, ExportOptions, ExportResult};
pub use results::{OperationResult, OperationType, Results};
pub use schema::SchemaType;
pub use type_validator::TypeValidator;
