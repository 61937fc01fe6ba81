//! The schema cache itself.

use crate::CacheAdapter;
use backplane_types::{ClassSchema, CoreResult};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;
use std::sync::Arc;
use std::time::Duration;

const MAIN_SCHEMA: &str = "__MAIN_SCHEMA";
const SCHEMA_CACHE_PREFIX: &str = "__SCHEMA";

/// Configuration for a [`SchemaCache`].
#[derive(Debug, Clone)]
pub struct SchemaCacheConfig {
    /// How long a cached schema list stays valid. Zero disables caching.
    pub ttl: Duration,
    /// Pin the fixed key prefix instead of a per-instance random one. Use
    /// only when exactly one logical cache shares the backing store.
    pub single_cache: bool,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            single_cache: false,
        }
    }
}

/// TTL-bounded cache of the full class-schema list.
///
/// Concurrent read-through misses may both fetch and both write; that race is
/// tolerated because writes are idempotent full-list overwrites.
pub struct SchemaCache {
    ttl: Duration,
    prefix: String,
    cache: Arc<dyn CacheAdapter>,
}

impl SchemaCache {
    pub fn new(cache: Arc<dyn CacheAdapter>, config: SchemaCacheConfig) -> Self {
        let mut prefix = SCHEMA_CACHE_PREFIX.to_string();
        if !config.single_cache {
            prefix.push_str(&random_suffix(20));
        }
        Self {
            ttl: config.ttl,
            prefix,
            cache,
        }
    }

    fn key(&self) -> String {
        format!("{}{}", self.prefix, MAIN_SCHEMA)
    }

    /// The cached full schema list; `None` on miss or when caching is
    /// disabled.
    pub async fn get_all_classes(&self) -> CoreResult<Option<Vec<ClassSchema>>> {
        if self.ttl.is_zero() {
            return Ok(None);
        }
        let Some(value) = self.cache.get(&self.key()).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Caches the full schema list. A no-op when caching is disabled.
    pub async fn set_all_classes(&self, schemas: &[ClassSchema]) -> CoreResult<()> {
        if self.ttl.is_zero() {
            return Ok(());
        }
        debug!(count = schemas.len(), "Caching schema list");
        let value = serde_json::to_value(schemas)?;
        self.cache.put(&self.key(), value, Some(self.ttl)).await
    }

    /// One class schema, scanned out of the cached aggregate list. `None`
    /// when the class is absent or the list itself is a miss; no per-class
    /// cache is maintained.
    pub async fn get_one_schema(&self, class_name: &str) -> CoreResult<Option<ClassSchema>> {
        if self.ttl.is_zero() {
            return Ok(None);
        }
        let schemas = self.get_all_classes().await?.unwrap_or_default();
        Ok(schemas.into_iter().find(|s| s.class_name == class_name))
    }

    /// Drops the cached list. Invalidation is all-or-nothing.
    pub async fn clear(&self) -> CoreResult<()> {
        debug!("Clearing schema cache");
        self.cache.del(&self.key()).await
    }
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
