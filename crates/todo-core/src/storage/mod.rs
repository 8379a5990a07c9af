//! Storage layer
//!
//! Users and tasks live in a single SQLite database
//! (`<data_dir>/todo.db`). Front ends talk to it through the
//! [`Repository`] trait; [`SqliteRepository`] is the only implementation.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use repository::{Repository, SqliteRepository};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
