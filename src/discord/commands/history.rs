// Conversation-history commands.
//
// Storage failures here come from a direct user request, so they are
// reported back to the user instead of being swallowed.

use crate::discord::moderation::discord_actions::split_for_discord;
use crate::discord::{Context, Error};

/// Summarize your recent messages.
#[poise::command(slash_command)]
pub async fn summarize(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    ctx.defer().await?;

    match ctx.data().history.summarize(user_id).await {
        Ok(Some(summary)) => {
            for chunk in split_for_discord(&format!("Summary:\n{}", summary)) {
                ctx.say(chunk).await?;
            }
        }
        Ok(None) => {
            ctx.say("No messages to summarize!").await?;
        }
        Err(e) => {
            tracing::error!(user_id, "Summarize error: {}", e);
            ctx.say("Error generating summary").await?;
        }
    }

    Ok(())
}

/// Clear your stored conversation history.
#[poise::command(slash_command)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();

    match ctx.data().history.clear(user_id).await {
        Ok(()) => {
            ctx.say("🛡️ Security context cleared successfully!").await?;
        }
        Err(e) => {
            tracing::error!(user_id, "Clear error: {}", e);
            ctx.say("Error clearing context").await?;
        }
    }

    Ok(())
}
