//! The write stage: save triggers around a durable create or update.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use backplane_hooks::{TriggerRegistry, TriggerRequest};
use backplane_storage::Database;
use backplane_types::{Auth, CoreResult, ObjectSnapshot, TriggerKind};

/// Whether the write creates a new object or mutates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
}

/// Everything the write stage needs for one mutation.
///
/// The pre-image is attached by the pipeline when save triggers or
/// live-query subscriptions require one; creates never carry it.
pub struct WriteRequest {
    pub class_name: String,
    pub auth: Auth,
    pub operation: WriteOperation,
    /// Query predicate selecting the target (updates only).
    pub where_clause: Option<Value>,
    /// The fields to write.
    pub payload: Value,
    /// The object's state before the mutation, when fetched.
    pub original: Option<ObjectSnapshot>,
}

/// Executes one validated mutation and returns the fields the caller must
/// echo (at minimum the write timestamp).
#[async_trait]
pub trait WriteExecutor: Send + Sync {
    async fn execute(&self, request: WriteRequest) -> CoreResult<Value>;
}

/// Write stage over a [`Database`]: fires the before-save trigger (which may
/// rewrite the payload), performs the durable write, then fires the
/// after-save trigger without letting its failure undo the committed write.
pub struct DefaultWriteExecutor {
    application_id: String,
    database: Arc<dyn Database>,
    registry: Arc<TriggerRegistry>,
}

impl DefaultWriteExecutor {
    pub fn new(
        application_id: impl Into<String>,
        database: Arc<dyn Database>,
        registry: Arc<TriggerRegistry>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            database,
            registry,
        }
    }

    fn trigger_request(&self, request: &WriteRequest, payload: &Value) -> TriggerRequest {
        TriggerRequest {
            object: Some(ObjectSnapshot::from_value(
                &request.class_name,
                payload.clone(),
            )),
            original: request.original.clone(),
            master: request.auth.is_master,
            user: request.auth.user.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl WriteExecutor for DefaultWriteExecutor {
    async fn execute(&self, request: WriteRequest) -> CoreResult<Value> {
        let mut payload = request.payload.clone();

        if let Some(handler) = self
            .registry
            .get_trigger(
                &self.application_id,
                &request.class_name,
                TriggerKind::BeforeSave,
            )
            .await
        {
            let outcome = handler.run(self.trigger_request(&request, &payload)).await?;
            if let Some(mut rewritten) = outcome.into_object() {
                // The adapter annotates outbound objects with their class
                // name; it is not a storable field.
                if let Some(fields) = rewritten.as_object_mut() {
                    fields.remove("className");
                }
                payload = rewritten;
            }
        }

        let written = match request.operation {
            WriteOperation::Create => {
                self.database
                    .create(&request.class_name, payload.clone())
                    .await?
            }
            WriteOperation::Update => {
                let where_clause = request.where_clause.clone().unwrap_or_else(|| json!({}));
                self.database
                    .update(&request.class_name, &where_clause, payload.clone(), false)
                    .await?
            }
        };

        if let Some(handler) = self
            .registry
            .get_trigger(
                &self.application_id,
                &request.class_name,
                TriggerKind::AfterSave,
            )
            .await
        {
            let saved = merge_written(&payload, &written);
            if let Err(e) = handler.run(self.trigger_request(&request, &saved)).await {
                warn!(class_name = %request.class_name, error = %e, "afterSave trigger failed");
            }
        }

        Ok(written)
    }
}

/// The saved object as seen by after-save triggers: the written payload plus
/// the server-assigned fields returned by storage.
fn merge_written(payload: &Value, written: &Value) -> Value {
    let mut merged = payload.as_object().cloned().unwrap_or_default();
    if let Some(extra) = written.as_object() {
        for (key, value) in extra {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
