// Turns Discord message events into pipeline runs.
//
// Each message gets its own task so a slow verification never holds up
// the gateway or other messages.

use super::discord_actions::DiscordChatActions;
use crate::core::moderation::{ContextKind, IncomingMessage};
use crate::discord::Data;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Convert a serenity message into the core's message type.
pub fn to_incoming(msg: &serenity::Message) -> IncomingMessage {
    let context_kind = if msg.guild_id.is_some() {
        ContextKind::Group
    } else {
        ContextKind::Direct
    };

    IncomingMessage {
        sender_id: msg.author.id.get(),
        sender_name: msg.author.name.clone(),
        context_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        text: msg.content.clone(),
        context_kind,
        received_at: Utc::now(),
    }
}

/// Whether a message enters the pipeline at all.
///
/// Bot posts (including our own restorations and notices) are ignored, as are
/// attachment-only messages with no text. Whitespace-only text still goes
/// through so it lands in the sender's history.
pub fn should_process(author_is_bot: bool, content: &str) -> bool {
    !author_is_bot && !content.is_empty()
}

/// Spawn the moderation pipeline for one inbound message.
pub fn handle_message(ctx: &serenity::Context, msg: &serenity::Message, data: &Data) {
    if !should_process(msg.author.bot, &msg.content) {
        return;
    }

    let incoming = to_incoming(msg);
    let moderation = Arc::clone(&data.moderation);
    let actions = DiscordChatActions::new(ctx.http.clone());

    tokio::spawn(async move {
        let outcome = moderation.process_message(&actions, &incoming).await;
        tracing::debug!(
            message_id = incoming.message_id,
            outcome = ?outcome,
            "Moderation pipeline done"
        );
    });
}
