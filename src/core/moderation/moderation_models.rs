// Moderation domain models - data structures for the phishing pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts platform events into `IncomingMessage`.

use super::screening_rules::DEFAULT_KEYWORD_SAMPLE_SIZE;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Where a message was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// A shared channel: messages here are screened.
    Group,
    /// A one-to-one conversation: history only, never screened.
    Direct,
}

/// A message as it arrived from the chat platform.
///
/// Immutable once received; each pipeline invocation owns its own copy.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender_id: u64,
    pub sender_name: String,
    pub context_id: u64,
    pub message_id: u64,
    pub text: String,
    pub context_kind: ContextKind,
    pub received_at: DateTime<Utc>,
}

/// Structured verdict from the remote classifier.
///
/// Only ever built from a fully valid response; there is no partial form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassifierVerdict {
    pub is_phishing: bool,
    pub confidence: u8,
    pub reasons: Vec<String>,
}

/// Final decision stored in the moderation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationDecision {
    Deleted,
    #[allow(dead_code)]
    Restored,
    /// Reserved: unverifiable messages stay deleted without a record today.
    #[allow(dead_code)]
    DeletedUnverified,
}

impl ModerationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationDecision::Deleted => "deleted",
            ModerationDecision::Restored => "restored",
            ModerationDecision::DeletedUnverified => "deleted_unverified",
        }
    }

    #[cfg(test)]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deleted" => Some(ModerationDecision::Deleted),
            "restored" => Some(ModerationDecision::Restored),
            "deleted_unverified" => Some(ModerationDecision::DeletedUnverified),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModerationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One final moderation decision, written once per confirmed removal.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationRecord {
    pub sender_id: u64,
    pub context_id: u64,
    pub message_id: u64,
    pub content: String,
    pub decision: ModerationDecision,
    pub timestamp: DateTime<Utc>,
}

/// How a single message's pipeline ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    /// Not a group context; only history was updated.
    Skipped,
    /// The screener found nothing suspicious.
    Passed,
    /// Classifier confirmed phishing; the message stays deleted and is logged.
    Confirmed(ClassifierVerdict),
    /// Classifier cleared the message; `None` when the re-post failed.
    Cleared { restored_message_id: Option<u64> },
    /// Classifier unavailable or returned garbage; the message stays deleted.
    Unverified,
    /// The provisional removal failed, so verification never started.
    RemovalFailed,
}

/// Values the moderation core reads from the environment at startup.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Reserved: not consulted by the retain/delete decision.
    pub confidence_threshold: u8,
    pub max_history: usize,
    pub classifier_timeout: Duration,
    pub oversight_channel_id: u64,
    pub keyword_sample_size: usize,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 75,
            max_history: 35,
            classifier_timeout: Duration::from_secs(30),
            oversight_channel_id: 0,
            keyword_sample_size: DEFAULT_KEYWORD_SAMPLE_SIZE,
        }
    }
}
