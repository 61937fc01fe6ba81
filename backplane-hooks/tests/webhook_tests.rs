use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use backplane_hooks::{TriggerHandler, TriggerOutcome, TriggerRequest, WebhookAgents, WebhookTrigger};
use backplane_types::{CoreError, ObjectSnapshot, TriggerKind, UserIdentity};

fn agents() -> Arc<WebhookAgents> {
    Arc::new(WebhookAgents::new().unwrap())
}

fn note(fields: Value) -> ObjectSnapshot {
    ObjectSnapshot::from_value("Note", fields)
}

// ── Request shape ───────────────────────────────────────────────

#[tokio::test]
async fn posts_flat_context_with_class_annotated_objects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Parse-Webhook-Key", "hook-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": null })))
        .expect(1)
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_trigger(
        format!("{}/hook", server.uri()),
        Some("hook-secret".into()),
        TriggerKind::BeforeSave,
        agents(),
    );
    let outcome = hook
        .run(TriggerRequest {
            object: Some(note(json!({"objectId": "n1", "title": "draft"}))),
            original: Some(note(json!({"objectId": "n1", "title": "old"}))),
            master: false,
            user: Some(UserIdentity { id: "u1".into() }),
            installation_id: Some("ins1".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome, TriggerOutcome::Object(None));

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["triggerName"], "beforeSave");
    assert_eq!(body["object"]["className"], "Note");
    assert_eq!(body["object"]["title"], "draft");
    assert_eq!(body["original"]["title"], "old");
    assert_eq!(body["master"], false);
    assert_eq!(body["user"], "u1");
    assert_eq!(body["installationId"], "ins1");
}

#[tokio::test]
async fn missing_webhook_key_still_makes_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_function(format!("{}/fn", server.uri()), None, agents());
    let outcome = hook.run(TriggerRequest::default()).await.unwrap();
    assert_eq!(outcome, TriggerOutcome::Value(json!(42)));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("X-Parse-Webhook-Key").is_none());
    // Functions carry no triggerName field.
    let body: Value = requests[0].body_json().unwrap();
    assert!(body.get("triggerName").is_none());
}

// ── Response adaptation ─────────────────────────────────────────

#[tokio::test]
async fn before_save_success_strips_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": {
                "title": "rewritten",
                "createdAt": "2020-01-01T00:00:00.000Z",
                "updatedAt": "2020-01-02T00:00:00.000Z"
            }
        })))
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_trigger(server.uri(), None, TriggerKind::BeforeSave, agents());
    let outcome = hook
        .run(TriggerRequest {
            object: Some(note(json!({"title": "draft"}))),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TriggerOutcome::Object(Some(json!({"title": "rewritten"})))
    );
}

#[tokio::test]
async fn before_find_success_keeps_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": { "a": 1, "createdAt": "x", "updatedAt": "y" }
        })))
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_trigger(server.uri(), None, TriggerKind::BeforeFind, agents());
    let outcome = hook.run(TriggerRequest::default()).await.unwrap();
    assert_eq!(
        outcome,
        TriggerOutcome::Object(Some(json!({ "a": 1, "createdAt": "x", "updatedAt": "y" })))
    );
}

#[tokio::test]
async fn error_field_aborts_with_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error": { "code": 119, "error": "denied" } })),
        )
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_trigger(server.uri(), None, TriggerKind::BeforeDelete, agents());
    let err = hook.run(TriggerRequest::default()).await.unwrap_err();
    match err {
        CoreError::Webhook { code, message } => {
            assert_eq!(code, 119);
            assert_eq!(message, "denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_reports_a_truncated_excerpt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!DOCTYPE html>".repeat(20)))
        .mount(&server)
        .await;

    let hook = WebhookTrigger::for_function(server.uri(), None, agents());
    let err = hook.run(TriggerRequest::default()).await.unwrap_err();
    match err {
        CoreError::MalformedResponse { partial } => {
            assert_eq!(partial.len(), 100);
            assert!(partial.starts_with("<!DOCTYPE html>"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
