use std::sync::Arc;

use serde_json::{Value, json};

use backplane_hooks::{HooksController, TriggerRegistry, WebhookAgents};
use backplane_storage::{Database, MemoryDatabase};
use backplane_types::{CoreError, HOOKS_CLASS, TriggerKind};

const APP: &str = "test-app";

struct Fixture {
    database: Arc<MemoryDatabase>,
    registry: Arc<TriggerRegistry>,
    controller: HooksController,
}

fn fixture() -> Fixture {
    let database = Arc::new(MemoryDatabase::new());
    let registry = Arc::new(TriggerRegistry::new());
    let controller = HooksController::new(
        APP,
        Some("hook-secret".into()),
        Arc::clone(&database) as Arc<dyn Database>,
        Arc::clone(&registry),
        Arc::new(WebhookAgents::new().unwrap()),
    );
    Fixture {
        database,
        registry,
        controller,
    }
}

fn function_decl(name: &str) -> Value {
    json!({ "functionName": name, "url": format!("https://hooks.test/{name}") })
}

fn trigger_decl(class: &str, kind: &str) -> Value {
    json!({ "className": class, "triggerName": kind, "url": "https://hooks.test/trigger" })
}

// ── Create / identity collisions ────────────────────────────────

#[tokio::test]
async fn create_function_hook_persists_and_registers() {
    let fx = fixture();
    let created = fx.controller.create_hook(&function_decl("sendEmail")).await.unwrap();
    assert_eq!(created["functionName"], "sendEmail");

    assert_eq!(fx.database.count(HOOKS_CLASS).await, 1);
    assert!(fx.registry.get_function(APP, "sendEmail").await.is_some());
}

#[tokio::test]
async fn create_twice_fails_with_already_exists() {
    let fx = fixture();
    fx.controller.create_hook(&function_decl("sendEmail")).await.unwrap();

    let err = fx
        .controller
        .create_hook(&function_decl("sendEmail"))
        .await
        .unwrap_err();
    match err {
        CoreError::HookAlreadyExists(message) => {
            assert_eq!(message, "function name: sendEmail already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.database.count(HOOKS_CLASS).await, 1);
}

#[tokio::test]
async fn trigger_collision_names_class_and_trigger() {
    let fx = fixture();
    fx.controller
        .create_hook(&trigger_decl("Note", "beforeSave"))
        .await
        .unwrap();

    let err = fx
        .controller
        .create_hook(&trigger_decl("Note", "beforeSave"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "class Note already has trigger beforeSave"
    );

    // Different kind on the same class is a distinct identity.
    fx.controller
        .create_hook(&trigger_decl("Note", "afterSave"))
        .await
        .unwrap();
}

// ── Update ──────────────────────────────────────────────────────

#[tokio::test]
async fn update_without_prior_record_fails_not_found() {
    let fx = fixture();
    let err = fx
        .controller
        .update_hook(&function_decl("missing"))
        .await
        .unwrap_err();
    match err {
        CoreError::ObjectNotFound(message) => {
            assert_eq!(message, "no function named: missing is defined");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn update_replaces_the_url_in_place() {
    let fx = fixture();
    fx.controller.create_hook(&function_decl("sendEmail")).await.unwrap();

    fx.controller
        .update_hook(&json!({ "functionName": "sendEmail", "url": "https://hooks.test/v2" }))
        .await
        .unwrap();

    assert_eq!(fx.database.count(HOOKS_CLASS).await, 1);
    let hook = fx.controller.get_function("sendEmail").await.unwrap().unwrap();
    assert_eq!(hook["url"], "https://hooks.test/v2");
}

#[tokio::test]
async fn create_or_update_upserts_regardless_of_prior_state() {
    let fx = fixture();

    // First call inserts.
    fx.controller
        .create_or_update_hook(&function_decl("sendEmail"))
        .await
        .unwrap();
    assert_eq!(fx.database.count(HOOKS_CLASS).await, 1);

    // Second call replaces in place instead of colliding.
    fx.controller
        .create_or_update_hook(&json!({ "functionName": "sendEmail", "url": "https://hooks.test/v2" }))
        .await
        .unwrap();
    assert_eq!(fx.database.count(HOOKS_CLASS).await, 1);
    let hook = fx.controller.get_function("sendEmail").await.unwrap().unwrap();
    assert_eq!(hook["url"], "https://hooks.test/v2");
    assert!(fx.registry.get_function(APP, "sendEmail").await.is_some());
}

// ── Reads ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_queries_split_by_shape_and_strip_object_ids() {
    let fx = fixture();
    fx.controller.create_hook(&function_decl("sendEmail")).await.unwrap();
    fx.controller
        .create_hook(&trigger_decl("Note", "beforeSave"))
        .await
        .unwrap();

    let functions = fx.controller.get_functions().await.unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0]["functionName"], "sendEmail");
    assert!(functions[0].get("objectId").is_none());

    let triggers = fx.controller.get_triggers().await.unwrap();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0]["className"], "Note");
    assert!(triggers[0].get("objectId").is_none());

    let one = fx
        .controller
        .get_trigger("Note", TriggerKind::BeforeSave)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(one["triggerName"], "beforeSave");
}

// ── Delete ──────────────────────────────────────────────────────

#[tokio::test]
async fn delete_function_clears_registry_and_storage() {
    let fx = fixture();
    fx.controller.create_hook(&function_decl("sendEmail")).await.unwrap();

    fx.controller.delete_function("sendEmail").await.unwrap();
    assert!(fx.registry.get_function(APP, "sendEmail").await.is_none());
    assert_eq!(fx.database.count(HOOKS_CLASS).await, 0);
}

#[tokio::test]
async fn delete_of_absent_hook_propagates_not_found() {
    let fx = fixture();
    let err = fx.controller.delete_function("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Startup load ────────────────────────────────────────────────

#[tokio::test]
async fn load_registers_persisted_hooks_and_skips_invalid_rows() {
    let fx = fixture();
    fx.database
        .create(HOOKS_CLASS, function_decl("sendEmail"))
        .await
        .unwrap();
    fx.database
        .create(HOOKS_CLASS, trigger_decl("Note", "beforeDelete"))
        .await
        .unwrap();
    // A row with no recognizable shape must not abort the load.
    fx.database
        .create(HOOKS_CLASS, json!({ "url": "https://hooks.test/orphan" }))
        .await
        .unwrap();

    fx.controller.load().await.unwrap();

    assert!(fx.registry.get_function(APP, "sendEmail").await.is_some());
    assert!(
        fx.registry
            .get_trigger(APP, "Note", TriggerKind::BeforeDelete)
            .await
            .is_some()
    );
}
