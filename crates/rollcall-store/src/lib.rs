//! rollcall-store: SQLite storage for students and teachers.
//!
//! Statements are plain functions over a `rusqlite::Connection` so the CLI
//! can use them directly; the daemon goes through the async [`Database`]
//! handle instead.

pub mod database;
pub mod schema;
pub mod students;
pub mod teachers;

pub use database::Database;
pub use students::{NewStudent, StudentRecord, StudentSummary};
pub use teachers::Teacher;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Connection(#[from] tokio_rusqlite::Error),
}
