// History service - keeps a bounded buffer of each user's recent messages and
// turns it into a summary on request.

use crate::core::ai::{AiProvider, AiService};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

pub const SUMMARY_PROMPT: &str = "Summarize the following conversation in 5 bullet points:";
pub const SUMMARY_FAILED: &str = "⚠️ Error generating summary. Please try again later.";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Backend(String),

    /// Stored data did not match the expected encoding.
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Oldest first.
    async fn get_history(&self, user_id: u64) -> Result<Vec<String>, StorageError>;

    /// Append one message, dropping the oldest entries beyond the store's cap.
    async fn append_history(&self, user_id: u64, text: &str) -> Result<(), StorageError>;

    async fn clear_history(&self, user_id: u64) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn get_history(&self, user_id: u64) -> Result<Vec<String>, StorageError> {
        (**self).get_history(user_id).await
    }

    async fn append_history(&self, user_id: u64, text: &str) -> Result<(), StorageError> {
        (**self).append_history(user_id, text).await
    }

    async fn clear_history(&self, user_id: u64) -> Result<(), StorageError> {
        (**self).clear_history(user_id).await
    }
}

/// Keep only the newest `max_len` entries, preserving their order.
pub fn cap_history(history: &mut Vec<String>, max_len: usize) {
    if history.len() > max_len {
        let excess = history.len() - max_len;
        history.drain(..excess);
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct HistoryService<S: HistoryStore, P: AiProvider> {
    store: S,
    summarizer: AiService<P>,
}

impl<S: HistoryStore, P: AiProvider> HistoryService<S, P> {
    pub fn new(store: S, summarizer: AiService<P>) -> Self {
        Self { store, summarizer }
    }

    /// Summarize a user's history.
    ///
    /// Returns `Ok(None)` when there is nothing to summarize. Provider
    /// failures become a fixed apology; only storage failures are errors.
    pub async fn summarize(&self, user_id: u64) -> Result<Option<String>, StorageError> {
        let history = self.store.get_history(user_id).await?;
        if history.is_empty() {
            return Ok(None);
        }

        match self.summarizer.ask(&history.join("\n")).await {
            Ok(summary) => Ok(Some(summary)),
            Err(e) => {
                error!(user_id, "Summary generation failed: {}", e);
                Ok(Some(SUMMARY_FAILED.to_string()))
            }
        }
    }

    pub async fn clear(&self, user_id: u64) -> Result<(), StorageError> {
        self.store.clear_history(user_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, AiMessage};
    use dashmap::DashMap;
    use std::error::Error;

    struct MockHistoryStore {
        max_len: usize,
        history: DashMap<u64, Vec<String>>,
    }

    impl MockHistoryStore {
        fn new(max_len: usize) -> Self {
            Self {
                max_len,
                history: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl HistoryStore for MockHistoryStore {
        async fn get_history(&self, user_id: u64) -> Result<Vec<String>, StorageError> {
            Ok(self
                .history
                .get(&user_id)
                .map(|h| h.clone())
                .unwrap_or_default())
        }

        async fn append_history(&self, user_id: u64, text: &str) -> Result<(), StorageError> {
            let mut entry = self.history.entry(user_id).or_default();
            entry.push(text.to_string());
            cap_history(&mut entry, self.max_len);
            Ok(())
        }

        async fn clear_history(&self, user_id: u64) -> Result<(), StorageError> {
            self.history.remove(&user_id);
            Ok(())
        }
    }

    struct EchoProvider {
        fail: bool,
    }

    #[async_trait]
    impl AiProvider for EchoProvider {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            if self.fail {
                return Err("upstream 503".into());
            }
            Ok(format!("summary of: {}", messages[1].content))
        }
    }

    fn service(fail: bool) -> HistoryService<MockHistoryStore, EchoProvider> {
        HistoryService::new(
            MockHistoryStore::new(3),
            AiService::new(EchoProvider { fail }, SUMMARY_PROMPT, AiConfig::new("m")),
        )
    }

    #[test]
    fn test_cap_drops_oldest_and_keeps_order() {
        let mut history: Vec<String> = (1..=4).map(|i| format!("m{}", i)).collect();
        cap_history(&mut history, 3);
        assert_eq!(history, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_cap_leaves_short_history_alone() {
        let mut history = vec!["a".to_string()];
        cap_history(&mut history, 3);
        assert_eq!(history, vec!["a"]);
    }

    #[tokio::test]
    async fn test_summarize_empty_history() {
        let svc = service(false);
        assert_eq!(svc.summarize(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_summarize_joins_history_in_order() {
        let svc = service(false);
        for text in ["one", "two", "three", "four"] {
            svc.store.append_history(1, text).await.unwrap();
        }

        let summary = svc.summarize(1).await.unwrap().unwrap();
        assert_eq!(summary, "summary of: two\nthree\nfour");
    }

    #[tokio::test]
    async fn test_summarize_provider_failure_is_apology() {
        let svc = service(true);
        svc.store.append_history(1, "hello").await.unwrap();

        let summary = svc.summarize(1).await.unwrap().unwrap();
        assert_eq!(summary, SUMMARY_FAILED);
    }

    #[tokio::test]
    async fn test_clear_removes_history() {
        let svc = service(false);
        svc.store.append_history(1, "hello").await.unwrap();
        svc.clear(1).await.unwrap();
        assert_eq!(svc.summarize(1).await.unwrap(), None);
    }
}
