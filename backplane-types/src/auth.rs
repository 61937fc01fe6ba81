//! Per-request principal context.

use serde::{Deserialize, Serialize};

/// The authenticated user behind a request, when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Object id of the user record.
    pub id: String,
}

/// The principal a request runs as.
///
/// Carries the master-key flag, the read-only-master flag, the optional
/// authenticated user and the user's resolved role set. This is an immutable
/// input per request; the pipeline never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Auth {
    /// Request was made with the master key.
    pub is_master: bool,
    /// Request was made with the read-only master key.
    pub is_read_only: bool,
    /// The authenticated user, if any.
    pub user: Option<UserIdentity>,
    /// Role names resolved for the user (e.g. "role:admin").
    pub roles: Vec<String>,
}

impl Auth {
    /// A master-key principal.
    pub fn master() -> Self {
        Self {
            is_master: true,
            ..Default::default()
        }
    }

    /// A read-only master-key principal.
    pub fn read_only_master() -> Self {
        Self {
            is_master: true,
            is_read_only: true,
            ..Default::default()
        }
    }

    /// An unauthenticated (public) principal.
    pub fn nobody() -> Self {
        Self::default()
    }

    /// A principal authenticated as the given user.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user: Some(UserIdentity { id: id.into() }),
            ..Default::default()
        }
    }

    /// Attaches resolved roles to the principal.
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// True when the request carries neither a master key nor a user.
    pub fn is_unauthenticated(&self) -> bool {
        !self.is_master && self.user.is_none()
    }

    /// The ACL filter applied to destructive reads/writes: everyone (`"*"`)
    /// plus the user id plus the resolved roles. Master principals bypass
    /// ACLs entirely and get `None`.
    pub fn acl(&self) -> Option<Vec<String>> {
        if self.is_master {
            return None;
        }
        let mut acl = vec!["*".to_string()];
        if let Some(user) = &self.user {
            acl.push(user.id.clone());
            acl.extend(self.roles.iter().cloned());
        }
        Some(acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_has_no_acl() {
        assert_eq!(Auth::master().acl(), None);
    }

    #[test]
    fn nobody_acl_is_public_only() {
        assert_eq!(Auth::nobody().acl(), Some(vec!["*".to_string()]));
    }

    #[test]
    fn user_acl_includes_id_and_roles() {
        let auth = Auth::user("u1").with_roles(vec!["role:admin".to_string()]);
        assert_eq!(
            auth.acl(),
            Some(vec![
                "*".to_string(),
                "u1".to_string(),
                "role:admin".to_string()
            ])
        );
    }

    #[test]
    fn unauthenticated_detection() {
        assert!(Auth::nobody().is_unauthenticated());
        assert!(!Auth::master().is_unauthenticated());
        assert!(!Auth::user("u1").is_unauthenticated());
    }
}
