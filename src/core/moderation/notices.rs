// Oversight-channel notice texts, one per pipeline outcome.

use super::moderation_models::{ClassifierVerdict, IncomingMessage};

const SNIPPET_CHARS: usize = 100;

/// First `SNIPPET_CHARS` characters of the text, marked when cut.
pub fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn sender_line(message: &IncomingMessage) -> String {
    format!("• User: {} (<@{}>)", message.sender_name, message.sender_id)
}

pub fn confirmed_notice(message: &IncomingMessage, verdict: &ClassifierVerdict) -> String {
    let reasons = if verdict.reasons.is_empty() {
        "Unknown".to_string()
    } else {
        verdict.reasons.join(", ")
    };

    format!(
        "🚨 Confirmed phishing message deleted:\n\n{}\n• Confidence: {}%\n• Reasons: {}\n• Snippet: {}",
        sender_line(message),
        verdict.confidence,
        reasons,
        snippet(&message.text)
    )
}

pub fn restored_notice(message: &IncomingMessage) -> String {
    format!(
        "⚠️ False positive detected - message restored:\n\n{}\n• Snippet: {}",
        sender_line(message),
        snippet(&message.text)
    )
}

pub fn restore_failed_notice(message: &IncomingMessage) -> String {
    format!(
        "❗ False positive detected but the message could not be restored - please repost manually:\n\n{}\n• Channel: <#{}>\n• Snippet: {}",
        sender_line(message),
        message.context_id,
        snippet(&message.text)
    )
}

pub fn unverified_notice(message: &IncomingMessage) -> String {
    format!(
        "⚠️ AI verification failed - message remains deleted (unverified):\n\n{}\n• Snippet: {}",
        sender_line(message),
        snippet(&message.text)
    )
}

pub fn removal_failed_notice(message: &IncomingMessage) -> String {
    format!(
        "❗ Suspicious message could not be removed - please review manually:\n\n{}\n• Channel: <#{}>\n• Snippet: {}",
        sender_line(message),
        message.context_id,
        snippet(&message.text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::ContextKind;
    use chrono::Utc;

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            sender_id: 42,
            sender_name: "mallory".to_string(),
            context_id: 7,
            message_id: 9,
            text: text.to_string(),
            context_kind: ContextKind::Group,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_snippet_keeps_short_text_whole() {
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_snippet_cuts_on_char_boundary() {
        let long = "é".repeat(150);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_confirmed_notice_lists_confidence_and_reasons() {
        let verdict = ClassifierVerdict {
            is_phishing: true,
            confidence: 91,
            reasons: vec!["urgent tone".to_string(), "fake domain".to_string()],
        };
        let text = confirmed_notice(&message("pay now"), &verdict);
        assert!(text.contains("Confidence: 91%"));
        assert!(text.contains("urgent tone, fake domain"));
        assert!(text.contains("mallory"));
    }

    #[test]
    fn test_confirmed_notice_without_reasons() {
        let verdict = ClassifierVerdict {
            is_phishing: true,
            confidence: 60,
            reasons: vec![],
        };
        assert!(confirmed_notice(&message("x"), &verdict).contains("Reasons: Unknown"));
    }

    #[test]
    fn test_outcome_notices_are_distinct() {
        let msg = message("hello");
        let restored = restored_notice(&msg);
        let unverified = unverified_notice(&msg);
        let failed = removal_failed_notice(&msg);
        let not_restored = restore_failed_notice(&msg);

        assert!(restored.contains("message restored"));
        assert!(unverified.contains("unverified"));
        assert!(failed.contains("could not be removed"));
        assert!(not_restored.contains("could not be restored"));
        assert!(!not_restored.contains("message restored"));
        assert_ne!(restored, unverified);
    }
}
