//! TTL-gated schema cache for Backplane.
//!
//! The pipeline consults class schemas on every access-control decision; this
//! crate keeps a short-lived copy of the full schema list so those decisions
//! do not hit durable storage on every request.
//!
//! - A TTL of zero disables caching entirely: every read is a miss and every
//!   write is a no-op.
//! - Only the aggregate list is cached; per-class lookups are a linear scan
//!   over it.
//! - Each cache instance namespaces its key with a random prefix so
//!   independently constructed caches sharing one backing store never
//!   collide. Single-cache mode pins a fixed prefix instead, for when exactly
//!   one logical cache must be addressed deterministically.

mod adapter;
mod cache;

pub use adapter::{CacheAdapter, InMemoryCacheAdapter};
pub use cache::{SchemaCache, SchemaCacheConfig};
