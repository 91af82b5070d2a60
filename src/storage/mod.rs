//! # Storage
//!
//! Store contracts consumed by the pipelines, the in-memory reference
//! implementations, and a TTL cache for validator lookups.

pub mod cached;
pub mod memory;
pub mod repository;

pub use cached::CachedTypeValidatorRepository;
pub use memory::{InMemoryEntryRepository, InMemoryTemplateRepository, InMemoryTypeValidatorRepository};
pub use repository::{EntryRepository, TemplateRepository, TypeValidatorRepository};
