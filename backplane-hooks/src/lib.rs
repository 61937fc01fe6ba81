//! Trigger registry, webhook adapter and hook persistence for Backplane.
//!
//! Operators extend the pipeline by registering external HTTP endpoints as
//! lifecycle triggers and named functions. This crate covers the three
//! pieces of that seam:
//!
//! - **Registry** — the in-memory table mapping
//!   `(applicationId, class, trigger kind)` and `(applicationId, function)`
//!   to callables. The pipeline reads it on every operation; hook CRUD
//!   writes it.
//! - **Webhook adapter** — the callable installed for a hook: serializes the
//!   trigger context to flat JSON, POSTs it to the hook URL over a
//!   scheme-selected keep-alive client, and adapts the
//!   `{success, error}` response back into a trigger outcome.
//! - **Controller** — validates and persists hook declarations, keeps the
//!   registry in sync with hook CRUD, and re-registers all persisted hooks
//!   at startup.

mod controller;
mod registry;
mod webhook;

pub use controller::{Hook, HooksController};
pub use registry::{TriggerHandler, TriggerOutcome, TriggerRegistry, TriggerRequest};
pub use webhook::{WebhookAgents, WebhookTrigger};
