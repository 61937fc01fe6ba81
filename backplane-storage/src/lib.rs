//! Durable storage seam for Backplane.
//!
//! The pipeline treats durable storage as an opaque collaborator exposing
//! `find`/`create`/`update`/`destroy`/`load_schema`. Query-predicate matching
//! and the storage wire format belong to the implementation behind this
//! trait, not to the pipeline.
//!
//! [`MemoryDatabase`] implements the trait over in-process maps. It supports
//! the predicate subset this core actually issues (top-level equality and
//! `$exists`), which makes it sufficient for tests and local development.

mod database;
mod memory;

pub use database::Database;
pub use memory::MemoryDatabase;
