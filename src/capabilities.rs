//! The two capabilities a handler invocation depends on.
//!
//! Implementations are external collaborators: the handler only sees these
//! traits, so each side can be swapped or mocked on its own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, UpdateError};

/// AI-assisted extraction: interpret an instruction against a message.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Return the value the instruction asks for, or `None` when the
    /// message does not contain one. `Some("")` is also treated as empty by
    /// callers.
    async fn ask(
        &self,
        instruction: &str,
        message: &str,
    ) -> Result<Option<String>, ExtractionError>;
}

/// Partial-field update of the activity record bound to this invocation.
#[async_trait]
pub trait ActivityUpdater: Send + Sync {
    async fn update(&self, patch: &ActivityPatch) -> Result<(), UpdateError>;
}

/// Field update applied to an activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    pub email: String,
}

impl ActivityPatch {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// The patch as a JSON object, ready to merge into record fields.
    pub fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert(
            "email".to_string(),
            serde_json::Value::String(self.email.clone()),
        );
        fields
    }
}
