// Remote classifier client - the slow, authoritative second stage.
//
// Every failure mode (transport, timeout, schema) collapses to `None`. The
// orchestrator only ever sees a fully valid verdict or nothing.

use super::moderation_models::ClassifierVerdict;
use crate::core::ai::{AiConfig, AiProvider, AiService};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

/// Fixed instruction sent ahead of every escalated message.
pub const CLASSIFIER_INSTRUCTION: &str = r#"Analyze this message for phishing indicators. Respond with JSON:
{
    "is_phishing": boolean,
    "confidence": 0-100,
    "reasons": [strings]
}"#;

/// Port used by the orchestrator; mocked in tests.
#[async_trait]
pub trait PhishingClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Option<ClassifierVerdict>;
}

/// Classifier backed by a chat-completion provider.
pub struct RemoteClassifier<P: AiProvider> {
    service: AiService<P>,
    timeout: Duration,
}

impl<P: AiProvider> RemoteClassifier<P> {
    pub fn new(provider: P, model: impl Into<String>, timeout: Duration) -> Self {
        let config = AiConfig::new(model).with_json_response();
        Self {
            service: AiService::new(provider, CLASSIFIER_INSTRUCTION, config),
            timeout,
        }
    }
}

#[async_trait]
impl<P: AiProvider> PhishingClassifier for RemoteClassifier<P> {
    async fn classify(&self, text: &str) -> Option<ClassifierVerdict> {
        let content = match tokio::time::timeout(self.timeout, self.service.ask(text)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                error!("Phishing classification request failed: {}", e);
                return None;
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Phishing classification timed out"
                );
                return None;
            }
        };

        match parse_verdict(&content) {
            Ok(verdict) => Some(verdict),
            Err(reason) => {
                error!("Failed to parse classifier verdict: {}", reason);
                error!("Raw classifier content: {}", content);
                None
            }
        }
    }
}

/// Decode the inner JSON verdict. Missing or wrong-typed fields reject the whole verdict.
pub fn parse_verdict(content: &str) -> Result<ClassifierVerdict, String> {
    if content.trim().is_empty() {
        return Err("empty verdict content".to_string());
    }

    let verdict: ClassifierVerdict =
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))?;

    if verdict.confidence > 100 {
        return Err(format!("confidence out of range: {}", verdict.confidence));
    }

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::AiMessage;
    use std::error::Error;

    enum Reply {
        Content(&'static str),
        Failure,
        Hang,
    }

    struct ScriptedProvider {
        reply: Reply,
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            config: &AiConfig,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            assert_eq!(messages[0].content, CLASSIFIER_INSTRUCTION);
            assert!(config.json_response);

            match self.reply {
                Reply::Content(body) => Ok(body.to_string()),
                Reply::Failure => Err("connection refused".into()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("{}".to_string())
                }
            }
        }
    }

    fn classifier(reply: Reply) -> RemoteClassifier<ScriptedProvider> {
        RemoteClassifier::new(
            ScriptedProvider { reply },
            "test-model",
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_valid_verdict_is_returned() {
        let c = classifier(Reply::Content(
            r#"{"is_phishing": true, "confidence": 91, "reasons": ["urgent tone"]}"#,
        ));

        let verdict = c.classify("hi").await.unwrap();

        assert!(verdict.is_phishing);
        assert_eq!(verdict.confidence, 91);
        assert_eq!(verdict.reasons, vec!["urgent tone".to_string()]);
    }

    #[tokio::test]
    async fn test_extra_fields_are_tolerated() {
        let c = classifier(Reply::Content(
            r#"{"is_phishing": false, "confidence": 3, "reasons": [], "should_delete": false}"#,
        ));

        let verdict = c.classify("hi").await.unwrap();
        assert!(!verdict.is_phishing);
    }

    #[tokio::test]
    async fn test_transport_failure_is_absent() {
        assert_eq!(classifier(Reply::Failure).classify("hi").await, None);
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        assert_eq!(classifier(Reply::Hang).classify("hi").await, None);
    }

    #[tokio::test]
    async fn test_non_json_content_is_absent() {
        let c = classifier(Reply::Content("Sure! This looks like phishing."));
        assert_eq!(c.classify("hi").await, None);
    }

    #[test]
    fn test_missing_field_rejects_whole_verdict() {
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": 80}"#).is_err());
        assert!(parse_verdict(r#"{"confidence": 80, "reasons": []}"#).is_err());
    }

    #[test]
    fn test_wrong_types_reject_whole_verdict() {
        assert!(parse_verdict(r#"{"is_phishing": "yes", "confidence": 80, "reasons": []}"#).is_err());
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": 80.5, "reasons": []}"#).is_err());
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": 80, "reasons": "x"}"#).is_err());
    }

    #[test]
    fn test_confidence_must_be_within_percent_range() {
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": 101, "reasons": []}"#).is_err());
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": -1, "reasons": []}"#).is_err());
        assert!(parse_verdict(r#"{"is_phishing": true, "confidence": 100, "reasons": []}"#).is_ok());
    }

    #[test]
    fn test_empty_content_is_rejected() {
        assert!(parse_verdict("").is_err());
        assert!(parse_verdict("null").is_err());
    }
}
