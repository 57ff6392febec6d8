//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::pipeline::types::{DEFAULT_MESSAGE_POINTER, MessageLocator};

/// Default database location for the runner.
pub const DEFAULT_DB_PATH: &str = "./data/email-capture.db";

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// JSON pointer to the message text inside an event.
    pub message_pointer: String,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Activity record to update. A new record is created when unset.
    pub activity_id: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            message_pointer: DEFAULT_MESSAGE_POINTER.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            activity_id: None,
        }
    }
}

impl RunnerConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from a variable lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let message_pointer =
            lookup("EMAIL_CAPTURE_MESSAGE_POINTER").unwrap_or(defaults.message_pointer);
        validate_pointer(&message_pointer)?;

        let db_path = lookup("EMAIL_CAPTURE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let activity_id = lookup("EMAIL_CAPTURE_ACTIVITY_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            message_pointer,
            db_path,
            activity_id,
        })
    }

    pub fn message_locator(&self) -> MessageLocator {
        MessageLocator::pointer(self.message_pointer.clone())
    }
}

fn validate_pointer(pointer: &str) -> Result<(), ConfigError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: "EMAIL_CAPTURE_MESSAGE_POINTER".to_string(),
            message: format!("'{pointer}' is not a JSON pointer (must start with '/')"),
        })
    }
}
