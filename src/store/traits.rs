//! `ActivityStore` trait — async interface for activity record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::DatabaseError;

/// A persisted activity record.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub id: String,
    /// Free-form record fields (e.g. `email`).
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// The `email` field, if set to a string.
    pub fn email(&self) -> Option<&str> {
        self.fields.get("email").and_then(Value::as_str)
    }
}

/// Backend-agnostic activity storage.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert an empty activity record with the given ID.
    async fn create_activity(&self, id: &str) -> Result<ActivityRecord, DatabaseError>;

    /// Get an activity record by ID.
    async fn get_activity(&self, id: &str) -> Result<Option<ActivityRecord>, DatabaseError>;

    /// Merge `fields` into the record's fields as an RFC 7396 merge patch:
    /// nested objects merge recursively and a `null` value removes the key.
    ///
    /// Returns `DatabaseError::NotFound` when no record has this ID.
    async fn update_activity_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), DatabaseError>;

    /// Get the record, creating it first if it does not exist.
    ///
    /// Concurrent calls with the same ID all return the one stored record.
    async fn ensure_activity(&self, id: &str) -> Result<ActivityRecord, DatabaseError>;
}
