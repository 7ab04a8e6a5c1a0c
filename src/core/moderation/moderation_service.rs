// Moderation orchestrator - sequences the two-stage phishing pipeline.
//
// Received -> Screened -> (pass: Done)
//                      -> (escalate: Removed -> Verified -> Done)
//
// Removal always happens before the classifier is asked, and the final
// decision's side effects only after it answers. Nothing here returns an
// error: every failure is logged and the pipeline still reaches Done.
//
// NO Discord dependencies here - the platform is reached through `ChatActions`.

use super::classifier::PhishingClassifier;
use super::moderation_models::{
    ClassifierVerdict, ContextKind, IncomingMessage, ModerationConfig, ModerationDecision,
    ModerationOutcome, ModerationRecord,
};
use super::notices;
use super::screener::HeuristicScreener;
use crate::core::history::{HistoryStore, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ChatActionError {
    #[error("Chat platform error: {0}")]
    Platform(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Actions the pipeline needs from the chat platform.
#[async_trait]
pub trait ChatActions: Send + Sync {
    async fn delete_message(&self, context_id: u64, message_id: u64)
        -> Result<(), ChatActionError>;

    /// Put a removed message back in its origin context. Returns the new message id.
    async fn restore_message(&self, message: &IncomingMessage) -> Result<u64, ChatActionError>;

    async fn send_notification(&self, channel_id: u64, text: &str) -> Result<(), ChatActionError>;
}

/// Append-only record of final decisions.
#[async_trait]
pub trait ModerationLog: Send + Sync {
    async fn append_record(&self, record: ModerationRecord) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: ModerationLog + ?Sized> ModerationLog for Arc<T> {
    async fn append_record(&self, record: ModerationRecord) -> Result<(), StorageError> {
        (**self).append_record(record).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<C, H, L>
where
    C: PhishingClassifier,
    H: HistoryStore,
    L: ModerationLog,
{
    screener: HeuristicScreener,
    classifier: C,
    history: H,
    log: L,
    config: ModerationConfig,
}

impl<C, H, L> ModerationService<C, H, L>
where
    C: PhishingClassifier,
    H: HistoryStore,
    L: ModerationLog,
{
    pub fn new(
        screener: HeuristicScreener,
        classifier: C,
        history: H,
        log: L,
        config: ModerationConfig,
    ) -> Self {
        Self {
            screener,
            classifier,
            history,
            log,
            config,
        }
    }

    /// Run one message through the whole pipeline.
    pub async fn process_message<A>(&self, actions: &A, message: &IncomingMessage) -> ModerationOutcome
    where
        A: ChatActions + ?Sized,
    {
        // History is updated for every message, before and regardless of screening.
        if let Err(e) = self
            .history
            .append_history(message.sender_id, &message.text)
            .await
        {
            warn!(user_id = message.sender_id, "Failed to update chat history: {}", e);
        }

        if message.context_kind != ContextKind::Group {
            return ModerationOutcome::Skipped;
        }

        if !self.screener.screen(&message.text) {
            return ModerationOutcome::Passed;
        }

        if let Err(e) = actions
            .delete_message(message.context_id, message.message_id)
            .await
        {
            error!(
                user_id = message.sender_id,
                channel_id = message.context_id,
                message_id = message.message_id,
                "Failed to remove suspicious message: {}",
                e
            );
            self.notify(actions, &notices::removal_failed_notice(message))
                .await;
            return ModerationOutcome::RemovalFailed;
        }

        info!(
            user_id = message.sender_id,
            channel_id = message.context_id,
            message_id = message.message_id,
            "Message deleted (pre-check), awaiting verification"
        );

        let outcome = match self.classifier.classify(&message.text).await {
            Some(verdict) if verdict.is_phishing => self.confirm(actions, message, verdict).await,
            Some(_) => self.restore(actions, message).await,
            None => self.keep_removed(actions, message).await,
        };

        let elapsed = Utc::now() - message.received_at;
        debug!(
            message_id = message.message_id,
            elapsed_ms = elapsed.num_milliseconds(),
            "Moderation pipeline finished"
        );
        outcome
    }

    async fn confirm<A>(
        &self,
        actions: &A,
        message: &IncomingMessage,
        verdict: ClassifierVerdict,
    ) -> ModerationOutcome
    where
        A: ChatActions + ?Sized,
    {
        if verdict.confidence < self.config.confidence_threshold {
            debug!(
                confidence = verdict.confidence,
                threshold = self.config.confidence_threshold,
                "Confirmed verdict is below the reserved confidence threshold"
            );
        }

        let record = ModerationRecord {
            sender_id: message.sender_id,
            context_id: message.context_id,
            message_id: message.message_id,
            content: message.text.clone(),
            decision: ModerationDecision::Deleted,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.log.append_record(record).await {
            error!(message_id = message.message_id, "Failed to log moderation action: {}", e);
        }

        info!(
            user_id = message.sender_id,
            confidence = verdict.confidence,
            "Phishing confirmed, message stays deleted"
        );
        self.notify(actions, &notices::confirmed_notice(message, &verdict))
            .await;

        ModerationOutcome::Confirmed(verdict)
    }

    async fn restore<A>(&self, actions: &A, message: &IncomingMessage) -> ModerationOutcome
    where
        A: ChatActions + ?Sized,
    {
        let restored_message_id = match actions.restore_message(message).await {
            Ok(id) => {
                info!(
                    user_id = message.sender_id,
                    restored_message_id = id,
                    "Message restored (false positive)"
                );
                self.notify(actions, &notices::restored_notice(message)).await;
                Some(id)
            }
            Err(e) => {
                error!(message_id = message.message_id, "Failed to restore message: {}", e);
                self.notify(actions, &notices::restore_failed_notice(message))
                    .await;
                None
            }
        };

        ModerationOutcome::Cleared {
            restored_message_id,
        }
    }

    /// Fail closed: no verdict means the message stays removed.
    async fn keep_removed<A>(&self, actions: &A, message: &IncomingMessage) -> ModerationOutcome
    where
        A: ChatActions + ?Sized,
    {
        error!(
            message_id = message.message_id,
            "AI verification failed - message remains deleted"
        );
        self.notify(actions, &notices::unverified_notice(message))
            .await;

        ModerationOutcome::Unverified
    }

    async fn notify<A>(&self, actions: &A, text: &str)
    where
        A: ChatActions + ?Sized,
    {
        if let Err(e) = actions
            .send_notification(self.config.oversight_channel_id, text)
            .await
        {
            error!("Failed to notify oversight channel: {}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
