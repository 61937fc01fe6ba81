//! Reserved class names with special access rules.

/// Classes only a master-key principal may touch, for any operation.
pub const MASTER_ONLY_CLASSES: &[&str] = &[
    "JobStatus",
    "PushStatus",
    "Hooks",
    "GlobalConfig",
    "JobSchedule",
];

/// Non-master principals may not `find` or `delete` on this class.
pub const INSTALLATION_CLASS: &str = "Installation";

/// Deleting a record of this class always requires a pre-image so the cached
/// session token can be invalidated first.
pub const SESSION_CLASS: &str = "Session";

/// The user-identity class; ownership checks and the session-missing remap
/// apply to it.
pub const USER_CLASS: &str = "User";

/// The class hook declarations are persisted under.
pub const HOOKS_CLASS: &str = "Hooks";
