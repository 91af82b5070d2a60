//! # Error Handling
//!
//! Error types shared by the path, template, box and entry pipelines and by
//! every store adapter. Per-entry failures inside a batch are reported as
//! [`crate::domain::OperationResult`] values instead of this type.

pub mod types;

pub use types::{NboxError, Result};
