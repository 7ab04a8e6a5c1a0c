// Discord layer - commands, event handlers and the chat-platform adapter.
//
// This layer is THIN - it converts serenity types into core types and back.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::history::HistoryService;
use crate::core::moderation::{ModerationService, RemoteClassifier};
use crate::infra::ai::OpenRouterClient;
use crate::infra::moderation::SqliteModerationStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type SharedStore = Arc<SqliteModerationStore>;
pub type SharedProvider = Arc<OpenRouterClient>;

pub type BotModerationService =
    ModerationService<RemoteClassifier<SharedProvider>, SharedStore, SharedStore>;
pub type BotHistoryService = HistoryService<SharedStore, SharedProvider>;

/// Shared across every command and event.
pub struct Data {
    pub moderation: Arc<BotModerationService>,
    pub history: Arc<BotHistoryService>,
}
