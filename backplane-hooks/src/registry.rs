//! In-memory trigger and function registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use backplane_types::{CoreResult, ObjectSnapshot, TriggerKind, UserIdentity};

/// Context handed to a trigger handler when it fires.
///
/// Which fields are populated depends on the trigger kind: save/delete
/// triggers carry `object` (and `original` on update), while `beforeFind`
/// carries `query` and `options` instead.
#[derive(Debug, Clone, Default)]
pub struct TriggerRequest {
    pub object: Option<ObjectSnapshot>,
    pub original: Option<ObjectSnapshot>,
    pub query: Option<Value>,
    pub options: Option<Value>,
    pub master: bool,
    pub user: Option<UserIdentity>,
    pub installation_id: Option<String>,
}

/// What a trigger handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// A (possibly rewritten) object, or `None` when the handler had
    /// nothing to say. Produced by save/delete triggers.
    Object(Option<Value>),
    /// A raw value, as returned by functions and `beforeFind`.
    Value(Value),
}

impl TriggerOutcome {
    /// The rewritten object, if the handler returned one.
    pub fn into_object(self) -> Option<Value> {
        match self {
            TriggerOutcome::Object(object) => object,
            TriggerOutcome::Value(Value::Null) => None,
            TriggerOutcome::Value(value) => Some(value),
        }
    }
}

/// A callable installed in the registry.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn run(&self, request: TriggerRequest) -> CoreResult<TriggerOutcome>;
}

type HandlerRef = Arc<dyn TriggerHandler>;

/// Registry of trigger handlers and cloud functions, keyed by application.
///
/// Registration is last-write-wins: installing a handler under an occupied
/// key silently replaces the previous one. Collision policy for *persisted*
/// hooks lives in the controller, not here.
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: RwLock<HashMap<(String, String, TriggerKind), HandlerRef>>,
    functions: RwLock<HashMap<(String, String), HandlerRef>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_trigger(
        &self,
        application_id: &str,
        class_name: &str,
        kind: TriggerKind,
        handler: Arc<dyn TriggerHandler>,
    ) {
        debug!(application_id, class_name, kind = %kind, "Registering trigger");
        self.triggers.write().await.insert(
            (application_id.to_string(), class_name.to_string(), kind),
            handler,
        );
    }

    pub async fn remove_trigger(&self, application_id: &str, class_name: &str, kind: TriggerKind) {
        self.triggers.write().await.remove(&(
            application_id.to_string(),
            class_name.to_string(),
            kind,
        ));
    }

    pub async fn get_trigger(
        &self,
        application_id: &str,
        class_name: &str,
        kind: TriggerKind,
    ) -> Option<Arc<dyn TriggerHandler>> {
        self.triggers
            .read()
            .await
            .get(&(application_id.to_string(), class_name.to_string(), kind))
            .cloned()
    }

    /// Whether any of the given trigger kinds is registered for a class.
    pub async fn any_trigger(
        &self,
        application_id: &str,
        class_name: &str,
        kinds: &[TriggerKind],
    ) -> bool {
        let triggers = self.triggers.read().await;
        kinds.iter().any(|kind| {
            triggers.contains_key(&(
                application_id.to_string(),
                class_name.to_string(),
                *kind,
            ))
        })
    }

    pub async fn add_function(
        &self,
        application_id: &str,
        function_name: &str,
        handler: Arc<dyn TriggerHandler>,
    ) {
        debug!(application_id, function_name, "Registering function");
        self.functions.write().await.insert(
            (application_id.to_string(), function_name.to_string()),
            handler,
        );
    }

    pub async fn remove_function(&self, application_id: &str, function_name: &str) {
        self.functions
            .write()
            .await
            .remove(&(application_id.to_string(), function_name.to_string()));
    }

    pub async fn get_function(
        &self,
        application_id: &str,
        function_name: &str,
    ) -> Option<Arc<dyn TriggerHandler>> {
        self.functions
            .read()
            .await
            .get(&(application_id.to_string(), function_name.to_string()))
            .cloned()
    }
}
