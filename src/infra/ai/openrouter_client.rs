use crate::core::ai::{
    models::{AiConfig, AiMessage},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [AiMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    url: String,
}

impl OpenRouterClient {
    /// `timeout` bounds each whole request, connect through body.
    pub fn new(
        api_key: String,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            url: url.into(),
        })
    }

    fn build_request<'a>(messages: &'a [AiMessage], config: &'a AiConfig) -> ChatRequest<'a> {
        ChatRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: config
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body.
pub fn parse_completion_body(body: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    if body.trim().is_empty() {
        return Err("OpenRouter returned an empty response".into());
    }

    let response: ChatResponse = serde_json::from_str(body)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or("Failed to parse response content")?;

    Ok(content)
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let payload = Self::build_request(messages, config);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("OpenRouter Response: {} - {}", status, text);

        if !status.is_success() {
            return Err(format!("OpenRouter API error: {} - {}", status, text).into());
        }

        parse_completion_body(&text).map_err(|e| {
            tracing::error!("Failed to parse OpenRouter response: {}", e);
            tracing::error!("Raw response: {}", text);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_request_shape() {
        let messages = vec![AiMessage::system("instr"), AiMessage::user("hello")];
        let config = AiConfig::new("some/model").with_json_response();

        let json = serde_json::to_value(OpenRouterClient::build_request(&messages, &config)).unwrap();

        assert_eq!(json["model"], "some/model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["response_format"]["type"], "json_object");
        // Unset options are left out entirely
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let messages = vec![AiMessage::user("hello")];
        let config = AiConfig::new("m");

        let json = serde_json::to_value(OpenRouterClient::build_request(&messages, &config)).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_parse_extracts_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"is_phishing\":true}"}}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), r#"{"is_phishing":true}"#);
    }

    #[test]
    fn test_parse_rejects_broken_envelopes() {
        assert!(parse_completion_body("").is_err());
        assert!(parse_completion_body("   ").is_err());
        assert!(parse_completion_body("<html>Bad Gateway</html>").is_err());
        assert!(parse_completion_body(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion_body(r#"{"choices":[{"message":{"content":null}}]}"#).is_err());
        assert!(parse_completion_body(r#"{"error":{"message":"rate limited"}}"#).is_err());
    }
}
