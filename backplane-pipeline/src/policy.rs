//! Per-class access policy, evaluated before any I/O.

use backplane_types::{Auth, CoreError, CoreResult, INSTALLATION_CLASS, MASTER_ONLY_CLASSES};

/// The operation a request performs against a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Find,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Update | Operation::Delete
        )
    }
}

/// Rejects forbidden class/operation pairs for the given principal.
///
/// Three fixed rules, evaluated in order: non-master principals may not
/// enumerate or delete installations, non-master principals may not touch
/// the master-only classes at all, and a read-only master key may not
/// mutate anything.
pub fn enforce(operation: Operation, class_name: &str, auth: &Auth) -> CoreResult<()> {
    if !auth.is_master
        && class_name == INSTALLATION_CLASS
        && matches!(operation, Operation::Find | Operation::Delete)
    {
        return Err(CoreError::OperationForbidden(format!(
            "Clients aren't allowed to perform the {} operation on the installation collection.",
            operation.as_str()
        )));
    }
    if !auth.is_master && MASTER_ONLY_CLASSES.contains(&class_name) {
        return Err(CoreError::OperationForbidden(format!(
            "Clients aren't allowed to perform the {} operation on the {} collection.",
            operation.as_str(),
            class_name
        )));
    }
    if auth.is_read_only && operation.is_mutation() {
        return Err(CoreError::OperationForbidden(format!(
            "read-only masterKey isn't allowed to perform the {} operation.",
            operation.as_str()
        )));
    }
    Ok(())
}
