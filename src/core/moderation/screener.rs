// Heuristic screener - the fast, local first stage of the pipeline.
//
// Pure and synchronous: no I/O, no shared mutable state. A `true` result only
// means "worth escalating", never "confirmed phishing".

use super::screening_rules::ScreeningRules;
use regex::Regex;
use reqwest::Url;
use std::collections::HashSet;
use tracing::debug;

const URL_PATTERN: &str = r"https?://\S+";

pub struct HeuristicScreener {
    keyword_patterns: Vec<Regex>,
    url_pattern: Regex,
    trusted_domains: HashSet<String>,
    shortener_domains: HashSet<String>,
}

impl HeuristicScreener {
    /// Compile the sampled keyword patterns once.
    pub fn new(rules: ScreeningRules) -> Result<Self, regex::Error> {
        let keyword_patterns = rules
            .sampled_keywords()
            .iter()
            .map(|keyword| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keyword_patterns,
            url_pattern: Regex::new(URL_PATTERN)?,
            trusted_domains: rules.trusted_domains,
            shortener_domains: rules.shortener_domains,
        })
    }

    /// Decide whether a message should be escalated to the remote classifier.
    ///
    /// Short-circuits on the first keyword or URL that trips a rule.
    pub fn screen(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let lowered = text.to_lowercase();
        if let Some(pattern) = self
            .keyword_patterns
            .iter()
            .find(|pattern| pattern.is_match(&lowered))
        {
            debug!(pattern = pattern.as_str(), "Screener matched keyword");
            return true;
        }

        // URLs come from the original text; hosts are case-folded by the parser.
        self.url_pattern
            .find_iter(text)
            .any(|found| self.url_is_suspicious(found.as_str()))
    }

    fn url_is_suspicious(&self, raw_url: &str) -> bool {
        // IP hosts and unparseable URLs have no registrable domain: skip them.
        let host = match Url::parse(raw_url) {
            Ok(url) => match url.domain() {
                Some(domain) => domain.to_string(),
                None => return false,
            },
            Err(_) => return false,
        };

        let registrable = match psl::domain_str(&host) {
            Some(domain) => domain,
            None => return false,
        };

        if self.shortener_domains.contains(registrable) {
            debug!(domain = registrable, "Screener matched URL shortener");
            return true;
        }

        if self.trusted_domains.contains(registrable) {
            return false;
        }

        // Look-alikes: "example.com-login.net" or "example.com.evil.net".
        let spoofed = self
            .trusted_domains
            .iter()
            .any(|trusted| registrable.contains(trusted.as_str()) || host.contains(trusted.as_str()));

        if spoofed {
            debug!(host = %host, "Screener matched trusted-domain look-alike");
        }
        spoofed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screener() -> HeuristicScreener {
        HeuristicScreener::new(ScreeningRules::default_rules()).unwrap()
    }

    #[test]
    fn test_plain_text_passes() {
        let s = screener();
        assert!(!s.screen("See you at the standup tomorrow"));
        assert!(!s.screen(""));
        assert!(!s.screen("   \n\t"));
    }

    #[test]
    fn test_sampled_keyword_any_case_escalates() {
        let s = screener();
        assert!(s.screen("Please VERIFY YOUR ACCOUNT before Friday"));
        assert!(s.screen("Security Alert: new sign-in"));
    }

    #[test]
    fn test_keyword_requires_word_boundaries() {
        let s = screener();
        assert!(!s.screen("how do I verify your accounts list?"));
        assert!(!s.screen("mysecurity alerting setup"));
    }

    #[test]
    fn test_keywords_outside_sample_are_not_checked() {
        let s = screener();
        assert!(!s.screen("This is your last warning"));

        let rules = ScreeningRules::default_rules().with_keyword_sample_size(usize::MAX);
        let full = HeuristicScreener::new(rules).unwrap();
        assert!(full.screen("This is your last warning"));
    }

    #[test]
    fn test_shortener_escalates_regardless_of_other_content() {
        let s = screener();
        assert!(s.screen("lunch menu: https://bit.ly/3xYz"));
        assert!(s.screen("https://www.tinyurl.com/abc and have a nice day"));
        assert!(s.screen("thread https://t.co/q1w2e3"));
    }

    #[test]
    fn test_trusted_domain_look_alikes_escalate() {
        let s = screener();
        assert!(s.screen("Log in at https://example.com.evil.net/login"));
        assert!(s.screen("Log in at https://example.com-secure.net/"));
        assert!(s.screen("https://accounts.myexample.com/reset"));
    }

    #[test]
    fn test_exact_trusted_domain_passes() {
        let s = screener();
        assert!(!s.screen("Docs live at https://example.com/docs"));
        assert!(!s.screen("Docs live at https://www.example.com/docs"));
        assert!(!s.screen("Portal: https://trusted-partner.org"));
    }

    #[test]
    fn test_unrelated_and_malformed_urls_pass() {
        let s = screener();
        assert!(!s.screen("https://www.rust-lang.org/learn"));
        assert!(!s.screen("http://192.168.1.10/admin"));
        assert!(!s.screen("broken link https://[::1"));
    }

    #[test]
    fn test_any_url_is_enough() {
        let s = screener();
        assert!(s.screen("https://www.rust-lang.org then https://goo.gl/abc"));
    }

    #[test]
    fn test_screen_is_idempotent() {
        let s = screener();
        let text = "Click https://example.com.evil.net now";
        assert_eq!(s.screen(text), s.screen(text));
        let benign = "nothing to see";
        assert_eq!(s.screen(benign), s.screen(benign));
    }
}
