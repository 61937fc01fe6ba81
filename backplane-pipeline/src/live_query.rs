//! Live-query notification seam.

use async_trait::async_trait;
use serde_json::Value;

use backplane_types::{CoreResult, ObjectSnapshot};

/// Entry point of the live-query subsystem.
///
/// The pipeline asks whether a class has subscribers (which forces a
/// pre-image fetch on mutation) and reports committed deletes. Delivery to
/// subscribed clients is entirely the implementation's concern.
#[async_trait]
pub trait LiveQueryNotifier: Send + Sync {
    /// Whether any subscription is watching the class.
    fn tracks_class(&self, class_name: &str) -> bool;

    /// Reports a committed delete, with the pre-image when one was fetched
    /// and the class-level permissions in force at delete time.
    async fn on_after_delete(
        &self,
        class_name: &str,
        deleted: Option<&ObjectSnapshot>,
        class_level_permissions: Option<&Value>,
    ) -> CoreResult<()>;
}

/// Notifier used when live query is disabled. Tracks nothing, drops
/// everything.
#[derive(Debug, Default)]
pub struct NoopLiveQuery;

#[async_trait]
impl LiveQueryNotifier for NoopLiveQuery {
    fn tracks_class(&self, _class_name: &str) -> bool {
        false
    }

    async fn on_after_delete(
        &self,
        _class_name: &str,
        _deleted: Option<&ObjectSnapshot>,
        _class_level_permissions: Option<&Value>,
    ) -> CoreResult<()> {
        Ok(())
    }
}
