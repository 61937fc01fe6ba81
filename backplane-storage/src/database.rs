//! The `Database` trait.

use async_trait::async_trait;
use backplane_types::{CoreResult, SchemaSnapshot};
use serde_json::Value;

/// Opaque durable storage and query engine.
///
/// All methods take the class name and a `where` predicate as JSON; the
/// predicate grammar is the implementation's concern. Errors propagate as
/// [`backplane_types::CoreError`] values unmodified — this seam performs no
/// retries.
#[async_trait]
pub trait Database: Send + Sync {
    /// Runs a query and returns the matching objects.
    ///
    /// `options` carries result-shaping options (keys, limit, ...) that this
    /// core forwards without interpreting.
    async fn find(
        &self,
        class_name: &str,
        where_clause: &Value,
        options: &Value,
    ) -> CoreResult<Vec<Value>>;

    /// Persists a new object and returns it with storage-assigned fields
    /// (object id, timestamps) filled in.
    async fn create(&self, class_name: &str, object: Value) -> CoreResult<Value>;

    /// Updates the first object matching the predicate. With `upsert`, a
    /// non-matching predicate inserts instead. Returns the stored object.
    async fn update(
        &self,
        class_name: &str,
        where_clause: &Value,
        object: Value,
        upsert: bool,
    ) -> CoreResult<Value>;

    /// Destroys all objects matching the predicate, restricted to the given
    /// ACL filter when one is supplied. Fails with a not-found error when
    /// nothing matched.
    async fn destroy(
        &self,
        class_name: &str,
        where_clause: &Value,
        acl: Option<&[String]>,
    ) -> CoreResult<()>;

    /// Loads the current full schema snapshot.
    async fn load_schema(&self) -> CoreResult<SchemaSnapshot>;
}
