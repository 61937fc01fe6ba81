//! Class schemas and schema snapshots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The field definitions and class-level permissions of a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSchema {
    pub class_name: String,
    /// Field name to field definition (type, target class, ...), kept as
    /// opaque JSON; the pipeline never interprets individual fields.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Class-level permissions consulted for ACL decisions and handed to
    /// live-query on delete.
    #[serde(default)]
    pub class_level_permissions: Map<String, Value>,
}

impl ClassSchema {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: Map::new(),
            class_level_permissions: Map::new(),
        }
    }
}

/// The full set of class schemas at a point in time, as loaded from durable
/// storage. ACL decisions for an operation are computed against the snapshot
/// taken for that operation, never a newer one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub classes: Vec<ClassSchema>,
}

impl SchemaSnapshot {
    pub fn new(classes: Vec<ClassSchema>) -> Self {
        Self { classes }
    }

    /// Finds one class schema by name.
    pub fn get_class(&self, class_name: &str) -> Option<&ClassSchema> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    /// The class-level permissions for a class; empty when the class is
    /// unknown.
    pub fn class_level_permissions(&self, class_name: &str) -> Map<String, Value> {
        self.get_class(class_name)
            .map(|c| c.class_level_permissions.clone())
            .unwrap_or_default()
    }
}
