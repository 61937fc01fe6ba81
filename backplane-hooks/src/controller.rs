//! Hook persistence and lifecycle management.
//!
//! Hook declarations live in the master-only `Hooks` collection. The
//! controller validates declarations, keeps the in-memory registry in sync
//! with CRUD on that collection, and re-registers every persisted hook at
//! startup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use backplane_storage::Database;
use backplane_types::{CoreError, CoreResult, HOOKS_CLASS, TriggerKind};

use crate::registry::TriggerRegistry;
use crate::webhook::{WebhookAgents, WebhookTrigger};

/// A validated hook declaration.
///
/// A declaration names either a cloud function or a class trigger, never
/// both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hook {
    #[serde(rename_all = "camelCase")]
    Function { function_name: String, url: String },
    #[serde(rename_all = "camelCase")]
    Trigger {
        class_name: String,
        trigger_name: TriggerKind,
        url: String,
    },
}

impl Hook {
    /// Validates a raw declaration. Shapes that name both a function and a
    /// trigger, or neither, are rejected.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| CoreError::InvalidHook("expected a JSON object".into()))?;
        let has_function = fields.contains_key("functionName");
        let has_trigger = fields.contains_key("className") || fields.contains_key("triggerName");
        if has_function == has_trigger {
            return Err(CoreError::InvalidHook(
                "exactly one of functionName or className/triggerName is required".into(),
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|_| CoreError::InvalidHook("missing url or unrecognized triggerName".into()))
    }

    fn identity_query(&self) -> Value {
        match self {
            Hook::Function { function_name, .. } => json!({ "functionName": function_name }),
            Hook::Trigger {
                class_name,
                trigger_name,
                ..
            } => json!({ "className": class_name, "triggerName": trigger_name.as_str() }),
        }
    }

    fn url(&self) -> &str {
        match self {
            Hook::Function { url, .. } | Hook::Trigger { url, .. } => url,
        }
    }
}

/// Manages persisted hooks for one application.
pub struct HooksController {
    application_id: String,
    webhook_key: Option<String>,
    database: Arc<dyn Database>,
    registry: Arc<TriggerRegistry>,
    agents: Arc<WebhookAgents>,
}

impl HooksController {
    pub fn new(
        application_id: impl Into<String>,
        webhook_key: Option<String>,
        database: Arc<dyn Database>,
        registry: Arc<TriggerRegistry>,
        agents: Arc<WebhookAgents>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            webhook_key,
            database,
            registry,
            agents,
        }
    }

    /// Re-registers every persisted hook. Individual failures are logged
    /// and skipped so one bad row cannot keep the rest from loading.
    pub async fn load(&self) -> CoreResult<()> {
        let rows = self
            .database
            .find(HOOKS_CLASS, &json!({}), &json!({}))
            .await?;
        info!(count = rows.len(), "Loading persisted hooks");
        for row in rows {
            match Hook::from_value(&row) {
                Ok(hook) => self.register(&hook).await,
                Err(e) => warn!(error = %e, "Skipping invalid persisted hook"),
            }
        }
        Ok(())
    }

    /// All persisted function hooks, with storage identifiers stripped.
    pub async fn get_functions(&self) -> CoreResult<Vec<Value>> {
        self.get_hooks(json!({ "functionName": { "$exists": true } }))
            .await
    }

    /// All persisted trigger hooks, with storage identifiers stripped.
    pub async fn get_triggers(&self) -> CoreResult<Vec<Value>> {
        self.get_hooks(json!({ "className": { "$exists": true } }))
            .await
    }

    pub async fn get_function(&self, function_name: &str) -> CoreResult<Option<Value>> {
        let rows = self
            .get_hooks(json!({ "functionName": function_name }))
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn get_trigger(
        &self,
        class_name: &str,
        trigger_name: TriggerKind,
    ) -> CoreResult<Option<Value>> {
        let rows = self
            .get_hooks(json!({ "className": class_name, "triggerName": trigger_name.as_str() }))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Persists a new hook. Fails if one already exists under the same
    /// identity.
    pub async fn create_hook(&self, declaration: &Value) -> CoreResult<Value> {
        let hook = Hook::from_value(declaration)?;
        let existing = self
            .database
            .find(HOOKS_CLASS, &hook.identity_query(), &json!({}))
            .await?;
        if !existing.is_empty() {
            return Err(match &hook {
                Hook::Function { function_name, .. } => CoreError::HookAlreadyExists(format!(
                    "function name: {function_name} already exists"
                )),
                Hook::Trigger {
                    class_name,
                    trigger_name,
                    ..
                } => CoreError::HookAlreadyExists(format!(
                    "class {class_name} already has trigger {trigger_name}"
                )),
            });
        }
        self.create_or_update(&hook).await
    }

    /// Replaces the URL of an existing hook. Fails if no hook exists under
    /// the given identity.
    pub async fn update_hook(&self, declaration: &Value) -> CoreResult<Value> {
        let hook = Hook::from_value(declaration)?;
        let existing = self
            .database
            .find(HOOKS_CLASS, &hook.identity_query(), &json!({}))
            .await?;
        if existing.is_empty() {
            return Err(match &hook {
                Hook::Function { function_name, .. } => CoreError::ObjectNotFound(format!(
                    "no function named: {function_name} is defined"
                )),
                Hook::Trigger {
                    class_name,
                    trigger_name,
                    ..
                } => CoreError::ObjectNotFound(format!(
                    "class {class_name} does not exist with trigger: {trigger_name}"
                )),
            });
        }
        self.create_or_update(&hook).await
    }

    /// Persists a hook whether or not one already exists under its
    /// identity. The PUT surface for hook declarations.
    pub async fn create_or_update_hook(&self, declaration: &Value) -> CoreResult<Value> {
        let hook = Hook::from_value(declaration)?;
        self.create_or_update(&hook).await
    }

    pub async fn delete_function(&self, function_name: &str) -> CoreResult<()> {
        self.registry
            .remove_function(&self.application_id, function_name)
            .await;
        self.database
            .destroy(HOOKS_CLASS, &json!({ "functionName": function_name }), None)
            .await
    }

    pub async fn delete_trigger(
        &self,
        class_name: &str,
        trigger_name: TriggerKind,
    ) -> CoreResult<()> {
        self.registry
            .remove_trigger(&self.application_id, class_name, trigger_name)
            .await;
        self.database
            .destroy(
                HOOKS_CLASS,
                &json!({ "className": class_name, "triggerName": trigger_name.as_str() }),
                None,
            )
            .await
    }

    async fn get_hooks(&self, query: Value) -> CoreResult<Vec<Value>> {
        let rows = self
            .database
            .find(HOOKS_CLASS, &query, &json!({}))
            .await?;
        Ok(rows
            .into_iter()
            .map(|mut row| {
                // objectId is a storage detail, not part of the hook shape.
                if let Some(fields) = row.as_object_mut() {
                    fields.remove("objectId");
                }
                row
            })
            .collect())
    }

    /// Registers the hook, then upserts its row. Registration comes first
    /// so the hook is live even if persistence lags.
    async fn create_or_update(&self, hook: &Hook) -> CoreResult<Value> {
        self.register(hook).await;
        let row = serde_json::to_value(hook)?;
        self.database
            .update(HOOKS_CLASS, &hook.identity_query(), row.clone(), true)
            .await?;
        Ok(row)
    }

    async fn register(&self, hook: &Hook) {
        match hook {
            Hook::Function { function_name, .. } => {
                let handler = WebhookTrigger::for_function(
                    hook.url(),
                    self.webhook_key.clone(),
                    Arc::clone(&self.agents),
                );
                self.registry
                    .add_function(&self.application_id, function_name, Arc::new(handler))
                    .await;
            }
            Hook::Trigger {
                class_name,
                trigger_name,
                ..
            } => {
                let handler = WebhookTrigger::for_trigger(
                    hook.url(),
                    self.webhook_key.clone(),
                    *trigger_name,
                    Arc::clone(&self.agents),
                );
                self.registry
                    .add_trigger(&self.application_id, class_name, *trigger_name, Arc::new(handler))
                    .await;
            }
        }
    }
}
