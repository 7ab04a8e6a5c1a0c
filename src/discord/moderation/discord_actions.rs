// Discord implementation of the pipeline's `ChatActions` port.

use crate::core::moderation::{ChatActionError, ChatActions, IncomingMessage};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Discord rejects messages longer than this many characters.
const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Split text into chunks Discord will accept, on char boundaries.
pub fn split_for_discord(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<char>>()
        .chunks(DISCORD_MESSAGE_LIMIT)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn platform_error(e: serenity::Error) -> ChatActionError {
    ChatActionError::Platform(e.to_string())
}

pub struct DiscordChatActions {
    http: Arc<serenity::Http>,
}

impl DiscordChatActions {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatActions for DiscordChatActions {
    async fn delete_message(
        &self,
        context_id: u64,
        message_id: u64,
    ) -> Result<(), ChatActionError> {
        serenity::ChannelId::new(context_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(platform_error)
    }

    /// Discord has no undelete, so the text is re-posted on the sender's behalf.
    async fn restore_message(&self, message: &IncomingMessage) -> Result<u64, ChatActionError> {
        let channel = serenity::ChannelId::new(message.context_id);
        let body = format!(
            "♻️ Restored message from <@{}>:\n{}",
            message.sender_id, message.text
        );

        let mut first_id = None;
        for chunk in split_for_discord(&body) {
            let sent = channel.say(&self.http, chunk).await.map_err(platform_error)?;
            first_id.get_or_insert(sent.id.get());
        }

        first_id.ok_or_else(|| ChatActionError::Platform("nothing to restore".to_string()))
    }

    async fn send_notification(&self, channel_id: u64, text: &str) -> Result<(), ChatActionError> {
        // Snowflakes are never zero; ChannelId::new would panic on it.
        if channel_id == 0 {
            return Err(ChatActionError::Platform("no oversight channel configured".to_string()));
        }

        serenity::ChannelId::new(channel_id)
            .say(&self.http, text)
            .await
            .map_err(platform_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_for_discord("hello"), vec!["hello".to_string()]);
    }

    #[test]
    fn test_long_text_is_split_on_char_boundaries() {
        let text = "ü".repeat(DISCORD_MESSAGE_LIMIT + 5);
        let chunks = split_for_discord(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), DISCORD_MESSAGE_LIMIT);
        assert_eq!(chunks[1].chars().count(), 5);
    }
}
