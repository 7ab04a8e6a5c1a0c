// Per-user conversation history - the buffer behind summaries.

pub mod history_service;

pub use history_service::*;
