// Static inputs for the heuristic screener.
//
// Loaded once at startup and shared read-only by every screening.

use std::collections::HashSet;

/// How many keywords from the front of the list are checked per message.
pub const DEFAULT_KEYWORD_SAMPLE_SIZE: usize = 5;

const PHISHING_KEYWORDS: &[&str] = &[
    // Account & verification
    "verify your account",
    "account suspension",
    "unusual login activity",
    "security alert",
    "confirm your identity",
    "account deactivation",
    "unauthorized access",
    "reactivate your account",
    "action required",
    "account verification failed",
    "limited-time security check",
    "identity confirmation",
    "account restriction",
    "update account details",
    "expiring soon",
    "account locked",
    "verify immediately",
    "suspicious activity detected",
    "login credentials expired",
    "account access revoked",
    // Urgency & fear
    "immediate action required",
    "urgent response needed",
    "deadline approaching",
    "last warning",
    "account termination",
    "legal action pending",
    "security breach",
    "critical alert",
    "failure to comply",
    "your attention is required",
    "time-sensitive",
    "overdue notice",
    "emergency update",
    "take action now",
    "restricted access",
    "immediate response necessary",
    "critical security measure",
    "act now to avoid penalties",
    "urgent account review",
    "security update pending",
    "24-hour notice",
    "final reminder",
    "immediate verification required",
];

const TRUSTED_DOMAINS: &[&str] = &["yourcompany.com", "trusted-partner.org", "example.com"];

const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "goo.gl",
    "tinyurl.com",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "adf.ly",
    "shorte.st",
    "t.co",
    "bit.do",
    "mcaf.ee",
    "rebrand.ly",
    "linktr.ee",
];

/// Keyword list plus the domain allow/deny sets.
#[derive(Debug, Clone)]
pub struct ScreeningRules {
    pub keywords: Vec<String>,
    pub trusted_domains: HashSet<String>,
    pub shortener_domains: HashSet<String>,
    /// Only `keywords[..keyword_sample_size]` is matched, trading recall for latency.
    pub keyword_sample_size: usize,
}

impl ScreeningRules {
    pub fn default_rules() -> Self {
        Self {
            keywords: PHISHING_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            trusted_domains: TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            shortener_domains: SHORTENER_DOMAINS.iter().map(|d| d.to_string()).collect(),
            keyword_sample_size: DEFAULT_KEYWORD_SAMPLE_SIZE,
        }
    }

    pub fn with_keyword_sample_size(mut self, sample_size: usize) -> Self {
        self.keyword_sample_size = sample_size;
        self
    }

    /// The slice of keywords actually checked per message.
    pub fn sampled_keywords(&self) -> &[String] {
        let end = self.keyword_sample_size.min(self.keywords.len());
        &self.keywords[..end]
    }
}

impl Default for ScreeningRules {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_prefix_of_keyword_list() {
        let rules = ScreeningRules::default_rules();
        let sample = rules.sampled_keywords();

        assert_eq!(sample.len(), DEFAULT_KEYWORD_SAMPLE_SIZE);
        assert_eq!(sample[0], "verify your account");
        assert_eq!(sample[4], "confirm your identity");
    }

    #[test]
    fn test_sample_size_larger_than_list_is_clamped() {
        let rules = ScreeningRules::default_rules().with_keyword_sample_size(10_000);
        assert_eq!(rules.sampled_keywords().len(), rules.keywords.len());
    }
}
