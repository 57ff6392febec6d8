//! Event pipeline.
//!
//! An inbound event flows through:
//! 1. `Event::message()` — locate the message text
//! 2. `Extractor::ask()` — AI-assisted extraction of the email address
//! 3. `ActivityUpdater::update()` — only when extraction found something

pub mod handler;
pub mod types;

pub use handler::{EXTRACT_EMAIL_INSTRUCTION, EmailCaptureHandler};
pub use types::{Event, MessageLocator};
