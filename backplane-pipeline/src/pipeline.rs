//! Per-operation orchestration of policy, triggers, storage and live query.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use backplane_hooks::{TriggerRegistry, TriggerRequest};
use backplane_schema::CacheAdapter;
use backplane_storage::Database;
use backplane_types::{
    Auth, CoreError, CoreResult, ObjectSnapshot, SESSION_CLASS, TriggerKind, USER_CLASS,
};

use crate::live_query::LiveQueryNotifier;
use crate::policy::{self, Operation};
use crate::write::{WriteExecutor, WriteOperation, WriteRequest};

/// Pipeline-wide configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The application every registry lookup is scoped to.
    pub application_id: String,
}

/// The mutation/query pipeline.
///
/// One instance per application; every collaborator is injected at
/// construction so independent instances can coexist in one process. Each
/// operation is a single sequential pass with no retries; errors abort the
/// remaining stages of that request and surface to the caller.
pub struct Pipeline {
    config: PipelineConfig,
    database: Arc<dyn Database>,
    registry: Arc<TriggerRegistry>,
    live_query: Arc<dyn LiveQueryNotifier>,
    /// Session-token cache, evicted before a session record is deleted.
    session_cache: Arc<dyn CacheAdapter>,
    writer: Arc<dyn WriteExecutor>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        database: Arc<dyn Database>,
        registry: Arc<TriggerRegistry>,
        live_query: Arc<dyn LiveQueryNotifier>,
        session_cache: Arc<dyn CacheAdapter>,
        writer: Arc<dyn WriteExecutor>,
    ) -> Self {
        Self {
            config,
            database,
            registry,
            live_query,
            session_cache,
            writer,
        }
    }

    /// Runs a query against a class, after the before-find trigger has had a
    /// chance to rewrite its predicate and options.
    pub async fn find(
        &self,
        auth: &Auth,
        class_name: &str,
        where_clause: Value,
        options: Value,
    ) -> CoreResult<Vec<Value>> {
        policy::enforce(Operation::Find, class_name, auth)?;
        let (where_clause, options) = self
            .run_before_find(auth, class_name, where_clause, options)
            .await?;
        self.database.find(class_name, &where_clause, &options).await
    }

    /// Fetches one object by id. A `find` specialized to an exact-identity
    /// predicate; the before-find trigger still applies.
    pub async fn get(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
        options: Value,
    ) -> CoreResult<Vec<Value>> {
        policy::enforce(Operation::Get, class_name, auth)?;
        let (where_clause, options) = self
            .run_before_find(auth, class_name, json!({ "objectId": object_id }), options)
            .await?;
        self.database.find(class_name, &where_clause, &options).await
    }

    /// Creates a new object.
    pub async fn create(
        &self,
        auth: &Auth,
        class_name: &str,
        payload: Value,
    ) -> CoreResult<Value> {
        policy::enforce(Operation::Create, class_name, auth)?;
        self.writer
            .execute(WriteRequest {
                class_name: class_name.to_string(),
                auth: auth.clone(),
                operation: WriteOperation::Create,
                where_clause: None,
                payload,
                original: None,
            })
            .await
    }

    /// Updates the objects matching a predicate.
    ///
    /// The pre-image is fetched only when a save trigger or a live-query
    /// subscription needs it; the fetch bypasses before-find triggers.
    pub async fn update(
        &self,
        auth: &Auth,
        class_name: &str,
        where_clause: Value,
        payload: Value,
    ) -> CoreResult<Value> {
        policy::enforce(Operation::Update, class_name, auth)?;

        let wants_pre_image = self
            .registry
            .any_trigger(
                &self.config.application_id,
                class_name,
                &[TriggerKind::BeforeSave, TriggerKind::AfterSave],
            )
            .await
            || self.live_query.tracks_class(class_name);
        let original = if wants_pre_image {
            self.database
                .find(class_name, &where_clause, &json!({}))
                .await?
                .into_iter()
                .next()
                .map(|value| ObjectSnapshot::from_value(class_name, value))
        } else {
            None
        };

        let result = self
            .writer
            .execute(WriteRequest {
                class_name: class_name.to_string(),
                auth: auth.clone(),
                operation: WriteOperation::Update,
                where_clause: Some(where_clause),
                payload,
                original,
            })
            .await;
        match result {
            Err(e) if e.is_not_found() && class_name == USER_CLASS && !auth.is_master => {
                Err(CoreError::SessionMissing("Insufficient auth.".into()))
            }
            other => other,
        }
    }

    /// Deletes one object by id.
    ///
    /// The session-missing remap covers every not-found raised past the
    /// policy gate, whether it comes from the pre-image fetch or from the
    /// destroy itself, so the error kind for a missing user record does not
    /// depend on which triggers happen to be registered.
    pub async fn delete(&self, auth: &Auth, class_name: &str, object_id: &str) -> CoreResult<()> {
        policy::enforce(Operation::Delete, class_name, auth)?;

        if class_name == USER_CLASS && auth.is_unauthenticated() {
            return Err(CoreError::SessionMissing(
                "Insufficient auth to delete user".into(),
            ));
        }

        match self.run_delete(auth, class_name, object_id).await {
            Err(e) if e.is_not_found() && class_name == USER_CLASS && !auth.is_master => {
                Err(CoreError::SessionMissing("Insufficient auth.".into()))
            }
            other => other,
        }
    }

    async fn run_delete(&self, auth: &Auth, class_name: &str, object_id: &str) -> CoreResult<()> {
        let pre_image = self.fetch_delete_pre_image(auth, class_name, object_id).await?;

        if let Some(handler) = self
            .registry
            .get_trigger(
                &self.config.application_id,
                class_name,
                TriggerKind::BeforeDelete,
            )
            .await
        {
            handler
                .run(TriggerRequest {
                    object: pre_image.clone(),
                    master: auth.is_master,
                    user: auth.user.clone(),
                    ..Default::default()
                })
                .await?;
        }

        // The snapshot is taken before the destroy so permissions reported
        // to live query reflect the schema at the moment of the operation.
        let schema = self.database.load_schema().await?;
        let acl = auth.acl();

        self.database
            .destroy(class_name, &json!({ "objectId": object_id }), acl.as_deref())
            .await?;
        debug!(class_name, object_id, "Object deleted");

        // The delete itself has committed; fanout failures are logged, not
        // surfaced.
        let perms = Value::Object(schema.class_level_permissions(class_name));
        if let Err(e) = self
            .live_query
            .on_after_delete(class_name, pre_image.as_ref(), Some(&perms))
            .await
        {
            warn!(class_name, error = %e, "live-query delete notification failed");
        }
        if let Some(handler) = self
            .registry
            .get_trigger(
                &self.config.application_id,
                class_name,
                TriggerKind::AfterDelete,
            )
            .await
        {
            let run = handler
                .run(TriggerRequest {
                    object: pre_image,
                    master: auth.is_master,
                    user: auth.user.clone(),
                    ..Default::default()
                })
                .await;
            if let Err(e) = run {
                warn!(class_name, error = %e, "afterDelete trigger failed");
            }
        }
        Ok(())
    }

    /// Fetches the delete pre-image when triggers, live query or session
    /// invalidation require one, enforcing session ownership and evicting
    /// the cached session token before the delete proceeds.
    async fn fetch_delete_pre_image(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
    ) -> CoreResult<Option<ObjectSnapshot>> {
        let required = class_name == SESSION_CLASS
            || self.live_query.tracks_class(class_name)
            || self
                .registry
                .any_trigger(
                    &self.config.application_id,
                    class_name,
                    &[TriggerKind::BeforeDelete, TriggerKind::AfterDelete],
                )
                .await;
        if !required {
            return Ok(None);
        }

        let found = self
            .database
            .find(class_name, &json!({ "objectId": object_id }), &json!({}))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::ObjectNotFound("Object not found for delete.".into()))?;
        let snapshot = ObjectSnapshot::from_value(class_name, found);

        if class_name == SESSION_CLASS {
            if !auth.is_master {
                let owner = snapshot
                    .data
                    .get("user")
                    .and_then(|user| user.get("objectId"))
                    .and_then(Value::as_str);
                let caller = auth.user.as_ref().map(|user| user.id.as_str());
                if owner.is_none() || owner != caller {
                    return Err(CoreError::InvalidSessionToken);
                }
            }
            if let Some(token) = snapshot.get_str("sessionToken") {
                self.session_cache.del(token).await?;
            }
        }

        Ok(Some(snapshot))
    }

    async fn run_before_find(
        &self,
        auth: &Auth,
        class_name: &str,
        where_clause: Value,
        options: Value,
    ) -> CoreResult<(Value, Value)> {
        let Some(handler) = self
            .registry
            .get_trigger(
                &self.config.application_id,
                class_name,
                TriggerKind::BeforeFind,
            )
            .await
        else {
            return Ok((where_clause, options));
        };

        let outcome = handler
            .run(TriggerRequest {
                query: Some(where_clause.clone()),
                options: Some(options.clone()),
                master: auth.is_master,
                user: auth.user.clone(),
                ..Default::default()
            })
            .await?;
        let rewritten = outcome.into_object();
        let Some(rewritten) = rewritten else {
            return Ok((where_clause, options));
        };
        let where_clause = rewritten
            .get("where")
            .cloned()
            .unwrap_or(where_clause);
        let options = rewritten.get("options").cloned().unwrap_or(options);
        Ok((where_clause, options))
    }
}
