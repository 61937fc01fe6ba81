//! In-memory `Database` implementation.

use crate::Database;
use async_trait::async_trait;
use backplane_types::{ClassSchema, CoreError, CoreResult, SchemaSnapshot};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process storage backend keyed by class name.
///
/// Predicate support is limited to top-level field equality and
/// `{"$exists": bool}`, the subset the pipeline and hooks controller issue.
#[derive(Default)]
pub struct MemoryDatabase {
    classes: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
    schema: RwLock<SchemaSnapshot>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the schema snapshot returned by `load_schema`.
    pub async fn set_schema(&self, snapshot: SchemaSnapshot) {
        *self.schema.write().await = snapshot;
    }

    /// Adds or replaces one class schema in the snapshot.
    pub async fn put_class_schema(&self, schema: ClassSchema) {
        let mut snapshot = self.schema.write().await;
        snapshot.classes.retain(|c| c.class_name != schema.class_name);
        snapshot.classes.push(schema);
    }

    /// Number of stored objects in a class, for test assertions.
    pub async fn count(&self, class_name: &str) -> usize {
        self.classes
            .read()
            .await
            .get(class_name)
            .map_or(0, Vec::len)
    }

    fn matches(object: &Map<String, Value>, where_clause: &Value) -> bool {
        let Some(conditions) = where_clause.as_object() else {
            return true;
        };
        conditions.iter().all(|(field, expected)| {
            if let Some(exists) = expected.get("$exists").and_then(Value::as_bool) {
                return object.contains_key(field) == exists;
            }
            object.get(field) == Some(expected)
        })
    }

    fn acl_allows_write(object: &Map<String, Value>, acl: &[String]) -> bool {
        // No ACL field means the object is publicly writable.
        let Some(object_acl) = object.get("ACL").and_then(Value::as_object) else {
            return true;
        };
        acl.iter().any(|entry| {
            object_acl
                .get(entry)
                .and_then(|perms| perms.get("write"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
    }

    fn new_object_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn find(
        &self,
        class_name: &str,
        where_clause: &Value,
        _options: &Value,
    ) -> CoreResult<Vec<Value>> {
        let classes = self.classes.read().await;
        let results = classes
            .get(class_name)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|o| Self::matches(o, where_clause))
                    .map(|o| Value::Object(o.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }

    async fn create(&self, class_name: &str, object: Value) -> CoreResult<Value> {
        let mut fields = match object {
            Value::Object(map) => map,
            other => {
                return Err(CoreError::Storage(format!(
                    "create expects a JSON object, got {other}"
                )))
            }
        };
        let now = Utc::now().to_rfc3339();
        fields
            .entry("objectId".to_string())
            .or_insert_with(|| Value::String(Self::new_object_id()));
        fields.insert("createdAt".to_string(), Value::String(now.clone()));
        fields.insert("updatedAt".to_string(), Value::String(now));

        let mut classes = self.classes.write().await;
        classes
            .entry(class_name.to_string())
            .or_default()
            .push(fields.clone());
        Ok(Value::Object(fields))
    }

    async fn update(
        &self,
        class_name: &str,
        where_clause: &Value,
        object: Value,
        upsert: bool,
    ) -> CoreResult<Value> {
        let updates = match object {
            Value::Object(map) => map,
            other => {
                return Err(CoreError::Storage(format!(
                    "update expects a JSON object, got {other}"
                )))
            }
        };
        let now = Utc::now().to_rfc3339();

        let mut classes = self.classes.write().await;
        let objects = classes.entry(class_name.to_string()).or_default();
        if let Some(existing) = objects.iter_mut().find(|o| Self::matches(o, where_clause)) {
            for (field, value) in updates {
                existing.insert(field, value);
            }
            existing.insert("updatedAt".to_string(), Value::String(now));
            return Ok(Value::Object(existing.clone()));
        }

        if !upsert {
            return Err(CoreError::ObjectNotFound(format!(
                "no object matched update on {class_name}"
            )));
        }

        let mut fields = updates;
        fields
            .entry("objectId".to_string())
            .or_insert_with(|| Value::String(Self::new_object_id()));
        fields.insert("createdAt".to_string(), Value::String(now.clone()));
        fields.insert("updatedAt".to_string(), Value::String(now));
        objects.push(fields.clone());
        Ok(Value::Object(fields))
    }

    async fn destroy(
        &self,
        class_name: &str,
        where_clause: &Value,
        acl: Option<&[String]>,
    ) -> CoreResult<()> {
        let mut classes = self.classes.write().await;
        let objects = classes.entry(class_name.to_string()).or_default();
        let before = objects.len();
        objects.retain(|o| {
            let matched = Self::matches(o, where_clause)
                && acl.is_none_or(|acl| Self::acl_allows_write(o, acl));
            !matched
        });
        if objects.len() == before {
            return Err(CoreError::ObjectNotFound(
                "Object not found for delete.".to_string(),
            ));
        }
        Ok(())
    }

    async fn load_schema(&self) -> CoreResult<SchemaSnapshot> {
        Ok(self.schema.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let db = MemoryDatabase::new();
        let created = db.create("Note", json!({"title": "x"})).await.unwrap();
        assert!(created["objectId"].is_string());
        assert!(created["createdAt"].is_string());
        assert_eq!(created["title"], "x");
    }

    #[tokio::test]
    async fn find_matches_equality_and_exists() {
        let db = MemoryDatabase::new();
        db.create("Hooks", json!({"functionName": "f", "url": "http://a"}))
            .await
            .unwrap();
        db.create("Hooks", json!({"className": "Note", "triggerName": "beforeSave", "url": "http://b"}))
            .await
            .unwrap();

        let by_name = db
            .find("Hooks", &json!({"functionName": "f"}), &json!({}))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let functions = db
            .find("Hooks", &json!({"functionName": {"$exists": true}}), &json!({}))
            .await
            .unwrap();
        assert_eq!(functions.len(), 1);
        let triggers = db
            .find(
                "Hooks",
                &json!({"className": {"$exists": true}, "triggerName": {"$exists": true}}),
                &json!({}),
            )
            .await
            .unwrap();
        assert_eq!(triggers.len(), 1);
    }

    #[tokio::test]
    async fn update_without_upsert_requires_match() {
        let db = MemoryDatabase::new();
        let err = db
            .update("Note", &json!({"objectId": "missing"}), json!({"a": 1}), false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let stored = db
            .update("Note", &json!({"objectId": "missing"}), json!({"a": 1}), true)
            .await
            .unwrap();
        assert_eq!(stored["a"], 1);
    }

    #[tokio::test]
    async fn destroy_honors_acl_filter() {
        let db = MemoryDatabase::new();
        db.create(
            "Note",
            json!({"objectId": "n1", "ACL": {"u1": {"write": true}}}),
        )
        .await
        .unwrap();

        // A stranger's ACL filter does not match, so nothing is destroyed.
        let acl = vec!["*".to_string(), "u2".to_string()];
        let err = db
            .destroy("Note", &json!({"objectId": "n1"}), Some(&acl))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let acl = vec!["*".to_string(), "u1".to_string()];
        db.destroy("Note", &json!({"objectId": "n1"}), Some(&acl))
            .await
            .unwrap();
        assert_eq!(db.count("Note").await, 0);
    }

    #[tokio::test]
    async fn destroy_without_match_is_not_found() {
        let db = MemoryDatabase::new();
        let err = db
            .destroy("Note", &json!({"objectId": "nope"}), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
