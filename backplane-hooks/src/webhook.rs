//! HTTP webhook adapter for externally hosted triggers and functions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use backplane_types::{CoreError, CoreResult, TriggerKind};

use crate::registry::{TriggerHandler, TriggerOutcome, TriggerRequest};

/// Parse error code reported when a webhook returns an error without one.
const SCRIPT_FAILED: i64 = 141;

/// How much of an undecodable webhook response is echoed back to the caller.
const MALFORMED_PREVIEW_LEN: usize = 100;

/// Keep-alive HTTP clients shared by every webhook in an application.
///
/// One client per scheme so plain-HTTP hooks and TLS hooks each reuse
/// their own connection pool.
pub struct WebhookAgents {
    plain: Client,
    tls: Client,
}

impl WebhookAgents {
    pub fn new() -> CoreResult<Self> {
        let build = || {
            Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|e| CoreError::Network(format!("Failed to build HTTP client: {e}")))
        };
        Ok(Self {
            plain: build()?,
            tls: build()?,
        })
    }

    fn client_for(&self, url: &str) -> &Client {
        if url.starts_with("https") {
            &self.tls
        } else {
            &self.plain
        }
    }
}

/// A trigger handler that forwards the request to an HTTP endpoint.
pub struct WebhookTrigger {
    url: String,
    key: Option<String>,
    trigger: Option<TriggerKind>,
    agents: Arc<WebhookAgents>,
}

impl WebhookTrigger {
    /// Adapter for a trigger hook of the given kind.
    pub fn for_trigger(
        url: impl Into<String>,
        key: Option<String>,
        kind: TriggerKind,
        agents: Arc<WebhookAgents>,
    ) -> Self {
        Self {
            url: url.into(),
            key,
            trigger: Some(kind),
            agents,
        }
    }

    /// Adapter for a cloud function hook.
    pub fn for_function(
        url: impl Into<String>,
        key: Option<String>,
        agents: Arc<WebhookAgents>,
    ) -> Self {
        Self {
            url: url.into(),
            key,
            trigger: None,
            agents,
        }
    }

    fn build_body(&self, request: &TriggerRequest) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(kind) = self.trigger {
            body.insert("triggerName".into(), Value::String(kind.as_str().into()));
        }
        if let Some(object) = &request.object {
            body.insert("object".into(), object.to_json_with_class());
        }
        if let Some(original) = &request.original {
            body.insert("original".into(), original.to_json_with_class());
        }
        if let Some(query) = &request.query {
            body.insert("where".into(), query.clone());
        }
        if let Some(options) = &request.options {
            body.insert("options".into(), options.clone());
        }
        body.insert("master".into(), Value::Bool(request.master));
        if let Some(user) = &request.user {
            body.insert("user".into(), Value::String(user.id.clone()));
        }
        if let Some(installation_id) = &request.installation_id {
            body.insert(
                "installationId".into(),
                Value::String(installation_id.clone()),
            );
        }
        body
    }

    fn decode_response(&self, text: &str) -> CoreResult<TriggerOutcome> {
        if text.is_empty() {
            return Ok(match self.trigger {
                Some(_) => TriggerOutcome::Object(None),
                None => TriggerOutcome::Value(Value::Null),
            });
        }
        let decoded: Value = serde_json::from_str(text).map_err(|_| {
            let partial: String = text.chars().take(MALFORMED_PREVIEW_LEN).collect();
            CoreError::MalformedResponse { partial }
        })?;

        if let Some(error) = decoded.get("error") {
            return Err(webhook_error(error));
        }

        let result = decoded.get("success").cloned().unwrap_or(Value::Null);
        match self.trigger {
            Some(TriggerKind::BeforeSave) => {
                // Hooks may echo the whole object back. The server owns the
                // timestamps, so a hook must not be able to rewrite them.
                let mut result = result;
                if let Some(object) = result.as_object_mut() {
                    object.remove("createdAt");
                    object.remove("updatedAt");
                }
                if result.is_null() {
                    Ok(TriggerOutcome::Object(None))
                } else {
                    Ok(TriggerOutcome::Object(Some(result)))
                }
            }
            Some(_) => {
                if result.is_null() {
                    Ok(TriggerOutcome::Object(None))
                } else {
                    Ok(TriggerOutcome::Object(Some(result)))
                }
            }
            None => Ok(TriggerOutcome::Value(result)),
        }
    }
}

fn webhook_error(error: &Value) -> CoreError {
    match error {
        Value::String(message) => CoreError::Webhook {
            code: SCRIPT_FAILED,
            message: message.clone(),
        },
        Value::Object(fields) => CoreError::Webhook {
            code: fields
                .get("code")
                .and_then(Value::as_i64)
                .unwrap_or(SCRIPT_FAILED),
            message: fields
                .get("error")
                .or_else(|| fields.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Script failed.")
                .to_string(),
        },
        other => CoreError::Webhook {
            code: SCRIPT_FAILED,
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl TriggerHandler for WebhookTrigger {
    async fn run(&self, request: TriggerRequest) -> CoreResult<TriggerOutcome> {
        let body = self.build_body(&request);

        let mut http = self
            .agents
            .client_for(&self.url)
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body);
        match &self.key {
            Some(key) => http = http.header("X-Parse-Webhook-Key", key),
            None => warn!("Making outgoing webhook request without webhookKey being set!"),
        }

        debug!(url = %self.url, "Dispatching webhook");
        let response = http
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("Webhook request failed: {e}")))?;
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("Failed to read webhook response: {e}")))?;

        self.decode_response(&text)
    }
}
