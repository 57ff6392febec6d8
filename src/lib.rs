//! email-capture — copy an email address from an inbound message into an
//! activity record.

pub mod capabilities;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod store;
