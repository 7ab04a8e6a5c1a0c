use super::models::{AiConfig, AiMessage};
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request and returns the first choice's content.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

// Lets the classifier and the summary service share one HTTP client.
#[async_trait]
impl<T: AiProvider + ?Sized> AiProvider for Arc<T> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

/// A provider bound to one system prompt and one generation config.
pub struct AiService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, system_prompt: impl Into<String>, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            config,
        }
    }

    /// Sends `System Prompt + user content` and returns the raw answer text.
    pub async fn ask(&self, user_content: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        let messages = vec![
            AiMessage::system(self.system_prompt.clone()),
            AiMessage::user(user_content),
        ];

        self.provider.chat_complete(&messages, &self.config).await
    }
}
