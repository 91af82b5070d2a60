//! # Secret Storage
//!
//! Secure entries are written to a [`SecretStore`] and replaced in the plain
//! store by a [`SecretReference`] to their location.
//!
//! # Security Considerations
//!
//! - Secret values are held in [`SecretValue`], which redacts `Debug` and
//!   `Display` output and zeroes memory on drop
//! - Log events name keys and versions, never values
//! - Plaintext leaves the store only through [`SecretStore::retrieve_value`]

pub mod memory;
pub mod store;
pub mod types;

pub use memory::{InMemorySecretStore, ParameterTier};
pub use store::{SecretReference, SecretStore};
pub use types::SecretValue;
