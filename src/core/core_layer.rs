// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "history/mod.rs"]
pub mod history;

#[path = "moderation/mod.rs"]
pub mod moderation;
