//! Shared types for the event pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default JSON pointer for the message text.
pub const DEFAULT_MESSAGE_POINTER: &str = "/message";

// ── Event ───────────────────────────────────────────────────────────

/// Inbound event from the trigger source.
///
/// The shape is owned by the trigger, so every field is kept as-is.
/// Only the message text is read, through a [`MessageLocator`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    /// Build an event whose message lives at the default location.
    pub fn with_message(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::String(message.into()));
        Self { fields }
    }

    /// Parse an event from JSON text. Non-object JSON is rejected.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Resolve the message text.
    ///
    /// Never fails: a string at the locator is used directly, any other
    /// value is rendered as compact JSON, and a missing value falls back to
    /// the whole event rendered as JSON.
    pub fn message(&self, locator: &MessageLocator) -> String {
        let found = match locator {
            MessageLocator::Pointer(pointer) => self.pointer(pointer).map(render_value),
            MessageLocator::Custom(locate) => locate(self),
        };
        found.unwrap_or_else(|| render_value(&Value::Object(self.fields.clone())))
    }

    fn pointer(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('/')?;
        let (head, rest) = match path.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.fields.get(&unescape_token(head))?;
        match rest {
            Some(rest) => value.pointer(&format!("/{rest}")),
            None => Some(value),
        }
    }
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Message locator ─────────────────────────────────────────────────

/// Function that pulls the message out of an event.
pub type LocateFn = Arc<dyn Fn(&Event) -> Option<String> + Send + Sync>;

/// Where in an [`Event`] the message text lives.
#[derive(Clone)]
pub enum MessageLocator {
    /// RFC 6901 JSON pointer, e.g. `/message` or `/payload/body`.
    Pointer(String),
    /// Caller-supplied lookup.
    Custom(LocateFn),
}

impl MessageLocator {
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self::Pointer(pointer.into())
    }

    pub fn custom(locate: impl Fn(&Event) -> Option<String> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(locate))
    }
}

impl Default for MessageLocator {
    fn default() -> Self {
        Self::Pointer(DEFAULT_MESSAGE_POINTER.to_string())
    }
}

impl std::fmt::Debug for MessageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pointer(p) => f.debug_tuple("Pointer").field(p).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
