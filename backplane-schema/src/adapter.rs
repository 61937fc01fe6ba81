//! Backing cache store seam.

use async_trait::async_trait;
use backplane_types::CoreResult;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A key/value cache with optional per-entry expiry.
///
/// Errors propagate unmodified to the caller; implementations are expected
/// to bring their own resilience. The pipeline also uses this seam for the
/// session-token cache it evicts on session delete.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Reads a value; `None` on miss or expiry.
    async fn get(&self, key: &str) -> CoreResult<Option<Value>>;

    /// Writes a value. `ttl` of `None` means no expiry.
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> CoreResult<()>;

    /// Removes a value. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> CoreResult<()>;
}

/// In-process cache adapter over a map with lazy expiry.
#[derive(Default)]
pub struct InMemoryCacheAdapter {
    entries: RwLock<HashMap<String, (Value, Option<Instant>)>>,
}

impl InMemoryCacheAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheAdapter for InMemoryCacheAdapter {
    async fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((_, Some(expires_at))) if *expires_at <= Instant::now() => Ok(None),
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> CoreResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn del(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
