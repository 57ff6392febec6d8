//! libSQL backend — async `ActivityStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{ActivityRecord, ActivityStore};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql Row to an ActivityRecord.
fn row_to_activity(row: &libsql::Row) -> Result<ActivityRecord, DatabaseError> {
    let get_text = |idx: i32| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Query(format!("activity row parse: {e}")))
    };

    let fields_str = get_text(1)?;
    let fields = match serde_json::from_str::<Value>(&fields_str)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?
    {
        Value::Object(map) => map,
        other => {
            return Err(DatabaseError::Serialization(format!(
                "activity fields are not an object: {other}"
            )));
        }
    };

    Ok(ActivityRecord {
        id: get_text(0)?,
        fields,
        created_at: parse_datetime(&get_text(2)?),
        updated_at: parse_datetime(&get_text(3)?),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const ACTIVITY_COLUMNS: &str = "id, fields, created_at, updated_at";

#[async_trait]
impl ActivityStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn create_activity(&self, id: &str) -> Result<ActivityRecord, DatabaseError> {
        let now = Utc::now();
        self.conn()
            .execute(
                "INSERT INTO activities (id, fields, created_at, updated_at) VALUES (?1, '{}', ?2, ?3)",
                params![id, now.to_rfc3339(), now.to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_activity: {e}")))?;

        debug!(activity_id = id, "Activity created");
        Ok(ActivityRecord {
            id: id.to_string(),
            fields: Map::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn ensure_activity(&self, id: &str) -> Result<ActivityRecord, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        // A single statement, so a concurrent creator cannot hit the
        // primary key between our check and our insert.
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO activities (id, fields, created_at, updated_at) VALUES (?1, '{}', ?2, ?2)",
                params![id, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("ensure_activity: {e}")))?;

        if inserted > 0 {
            debug!(activity_id = id, "Activity created");
        }

        self.get_activity(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "activity".to_string(),
                id: id.to_string(),
            })
    }

    async fn get_activity(&self, id: &str) -> Result<Option<ActivityRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_activity: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_activity(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_activity: {e}"))),
        }
    }

    async fn update_activity_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), DatabaseError> {
        let patch = serde_json::to_string(fields)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // json_patch merges in one statement, so concurrent updates to
        // different keys do not overwrite each other.
        let changed = self
            .conn()
            .execute(
                "UPDATE activities SET fields = json_patch(fields, ?1), updated_at = ?2 WHERE id = ?3",
                params![patch, now, id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_activity_fields: {e}")))?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "activity".to_string(),
                id: id.to_string(),
            });
        }

        debug!(
            activity_id = id,
            keys = ?fields.keys().collect::<Vec<_>>(),
            "Activity fields updated"
        );
        Ok(())
    }
}
