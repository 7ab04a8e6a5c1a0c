pub mod discord_actions;
pub mod message_handler;
