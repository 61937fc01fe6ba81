//! Core type definitions for Backplane.
//!
//! This crate defines the fundamental, storage-agnostic types used throughout
//! the mutation/query pipeline:
//! - The error taxonomy shared by every subsystem
//! - The per-request principal context ([`Auth`])
//! - Lifecycle trigger kinds ([`TriggerKind`])
//! - Object snapshots exchanged between pipeline stages and webhooks
//! - Class schemas and their class-level permissions
//! - Reserved class names with special access rules
//!
//! Everything operation-specific (the pipeline itself, hook persistence,
//! webhook dispatch) lives in the downstream crates, not here.

mod auth;
mod classes;
mod error;
mod object;
mod schema;
mod trigger;

pub use auth::{Auth, UserIdentity};
pub use classes::{
    HOOKS_CLASS, INSTALLATION_CLASS, MASTER_ONLY_CLASSES, SESSION_CLASS, USER_CLASS,
};
pub use error::{CoreError, CoreResult};
pub use object::ObjectSnapshot;
pub use schema::{ClassSchema, SchemaSnapshot};
pub use trigger::TriggerKind;
