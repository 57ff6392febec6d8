//! Persistence layer — libSQL-backed storage for activity records.

pub mod activity;
pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use activity::ActivityRecordUpdater;
pub use libsql_backend::LibSqlBackend;
pub use traits::{ActivityRecord, ActivityStore};
