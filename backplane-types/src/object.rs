//! Object snapshots exchanged between pipeline stages and webhooks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A class-scoped object as read from or written to durable storage.
///
/// Stages exchange these instead of bare JSON so the class name travels with
/// the data; the webhook adapter relies on that to annotate its canonical
/// JSON projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// The class this object belongs to.
    pub class_name: String,
    /// The object's fields.
    pub data: Map<String, Value>,
}

impl ObjectSnapshot {
    /// Wraps raw storage fields with their class name.
    pub fn new(class_name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            class_name: class_name.into(),
            data,
        }
    }

    /// Builds a snapshot from any JSON value; non-object values yield an
    /// empty field map.
    pub fn from_value(class_name: impl Into<String>, value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(class_name, data)
    }

    /// The object id, when present.
    pub fn object_id(&self) -> Option<&str> {
        self.data.get("objectId").and_then(|v| v.as_str())
    }

    /// A string field, when present.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    /// The canonical JSON projection with the class name attached, as sent
    /// to webhooks.
    pub fn to_json_with_class(&self) -> Value {
        let mut map = self.data.clone();
        map.insert(
            "className".to_string(),
            Value::String(self.class_name.clone()),
        );
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projection_attaches_class_name() {
        let snap = ObjectSnapshot::from_value("Note", json!({"objectId": "abc", "title": "x"}));
        let projected = snap.to_json_with_class();
        assert_eq!(projected["className"], "Note");
        assert_eq!(projected["objectId"], "abc");
    }

    #[test]
    fn object_id_accessor() {
        let snap = ObjectSnapshot::from_value("Note", json!({"objectId": "abc"}));
        assert_eq!(snap.object_id(), Some("abc"));
        assert_eq!(ObjectSnapshot::from_value("Note", json!({})).object_id(), None);
    }

    #[test]
    fn non_object_value_yields_empty_map() {
        let snap = ObjectSnapshot::from_value("Note", json!(42));
        assert!(snap.data.is_empty());
    }
}
