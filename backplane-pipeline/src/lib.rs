//! Mutation and query pipeline for Backplane.
//!
//! The pipeline is the single entry point for class-scoped `find`, `get`,
//! `create`, `update` and `delete` operations. Per request it:
//!
//! 1. Applies the class policy gate before any I/O.
//! 2. Fires pre-operation triggers (before-find, before-save,
//!    before-delete), which may rewrite the request or abort it.
//! 3. Performs the durable storage operation.
//! 4. Fires post-operation triggers and live-query notifications; once the
//!    mutation has committed, their failures are logged rather than
//!    surfaced.
//!
//! Every collaborator — storage, trigger registry, live query, session
//! cache, write stage — is injected at construction, so independent pipeline
//! instances can coexist in one process.

mod live_query;
mod pipeline;
mod policy;
mod write;

pub use live_query::{LiveQueryNotifier, NoopLiveQuery};
pub use pipeline::{Pipeline, PipelineConfig};
pub use policy::{Operation, enforce};
pub use write::{DefaultWriteExecutor, WriteExecutor, WriteOperation, WriteRequest};
