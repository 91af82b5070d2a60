//! Cached type validator lookups with TTL.
//!
//! Custom validators are read once per entry on every upsert and change
//! rarely, so lookups (including misses) are cached for a configured TTL.
//! Writes and deletes go through to the backing repository and update the
//! cache in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use nbox::storage::{CachedTypeValidatorRepository, InMemoryTypeValidatorRepository};
//! use std::time::Duration;
//!
//! let validators = CachedTypeValidatorRepository::new(
//!     InMemoryTypeValidatorRepository::new(),
//!     Duration::from_secs(60),
//! );
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::{OperationContext, OperationType, TypeValidator};
use crate::errors::Result;

use super::repository::TypeValidatorRepository;

/// Cached lookup with TTL. `None` records a known miss.
#[derive(Debug, Clone)]
struct CachedValidator {
    validator: Option<TypeValidator>,
    cached_at: Instant,
}

impl CachedValidator {
    fn new(validator: Option<TypeValidator>) -> Self {
        Self { validator, cached_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Wraps any [`TypeValidatorRepository`] with an in-memory read cache.
///
/// Uses `RwLock` so concurrent upserts can read validators in parallel.
#[derive(Debug)]
pub struct CachedTypeValidatorRepository<T: TypeValidatorRepository> {
    inner: T,
    cache: Arc<RwLock<HashMap<String, CachedValidator>>>,
    ttl: Duration,
}

impl<T: TypeValidatorRepository> CachedTypeValidatorRepository<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self { inner, cache: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// Drop every cached lookup.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        tracing::info!(count = count, "Cleared type validator cache");
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl<T: TypeValidatorRepository> TypeValidatorRepository for CachedTypeValidatorRepository<T> {
    async fn retrieve(&self, ctx: &OperationContext, name: &str) -> Result<Option<TypeValidator>> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(name) {
                if !cached.is_expired(self.ttl) {
                    tracing::debug!(validator = %name, "Cache hit for type validator");
                    return Ok(cached.validator.clone());
                }
            }
        }

        let validator = self.inner.retrieve(ctx, name).await?;
        self.cache.write().await.insert(name.to_string(), CachedValidator::new(validator.clone()));
        Ok(validator)
    }

    async fn upsert(&self, ctx: &OperationContext, validator: TypeValidator) -> Result<OperationType> {
        let action = self.inner.upsert(ctx, validator.clone()).await?;
        let name = validator.name.clone();
        self.cache.write().await.insert(name, CachedValidator::new(Some(validator)));
        Ok(action)
    }

    async fn list(&self, ctx: &OperationContext) -> Result<Vec<TypeValidator>> {
        // Listings always reflect the backing store.
        self.inner.list(ctx).await
    }

    async fn delete(&self, ctx: &OperationContext, name: &str) -> Result<()> {
        self.inner.delete(ctx, name).await?;
        self.cache.write().await.remove(name);
        tracing::debug!(validator = %name, "Removed type validator from cache after deletion");
        Ok(())
    }
}
