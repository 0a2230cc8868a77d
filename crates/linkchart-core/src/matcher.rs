//! Pairwise name matching.
//!
//! Four strategies are tried in a fixed order and the first hit wins.
//! Nothing is weighted or combined.

use crate::canon;
use crate::config::ResolutionConfig;
use std::collections::BTreeSet;

/// Which rule declared two names the same entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Identical non-empty core names.
    Exact,
    /// One core name contains the other.
    Containment,
    /// Levenshtein distance small relative to the longer name.
    EditDistance,
    /// Token sets overlap heavily.
    TokenJaccard,
}

/// A name prepared for repeated comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalName {
    pub core: String,
    pub tokens: BTreeSet<String>,
    char_len: usize,
}

impl CanonicalName {
    pub fn new(raw: &str) -> Self {
        let core = canon::core_name(raw);
        let tokens = core.split_whitespace().map(str::to_string).collect();
        let char_len = core.chars().count();
        Self {
            core,
            tokens,
            char_len,
        }
    }

    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }
}

/// Decides whether two raw names denote the same entity
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    config: ResolutionConfig,
}

impl NameMatcher {
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn is_match(&self, a: &str, b: &str) -> bool {
        self.strategy(a, b).is_some()
    }

    /// First strategy that matches `a` and `b`, if any.
    pub fn strategy(&self, a: &str, b: &str) -> Option<MatchStrategy> {
        self.compare(&CanonicalName::new(a), &CanonicalName::new(b))
    }

    pub fn compare(&self, a: &CanonicalName, b: &CanonicalName) -> Option<MatchStrategy> {
        if !a.is_empty() && a.core == b.core {
            return Some(MatchStrategy::Exact);
        }

        if self.contains(a, b) {
            return Some(MatchStrategy::Containment);
        }

        if self.edit_ratio(a, b).is_some_and(|r| r < self.config.edit_ratio_threshold) {
            return Some(MatchStrategy::EditDistance);
        }

        if jaccard(&a.tokens, &b.tokens).is_some_and(|j| j > self.config.jaccard_threshold) {
            return Some(MatchStrategy::TokenJaccard);
        }

        None
    }

    fn contains(&self, a: &CanonicalName, b: &CanonicalName) -> bool {
        let min = self.config.containment_min_len;
        if a.len() <= min || b.len() <= min {
            return false;
        }

        let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        shorter.len() > self.config.containment_shorter_min_len
            && longer.core.contains(shorter.core.as_str())
    }

    fn edit_ratio(&self, a: &CanonicalName, b: &CanonicalName) -> Option<f64> {
        let longest = a.len().max(b.len());
        if longest == 0 {
            return None;
        }
        Some(strsim::levenshtein(&a.core, &b.core) as f64 / longest as f64)
    }
}

/// `|a ∩ b| / |a ∪ b|`, or `None` when either set is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    Some(intersection as f64 / union as f64)
}

/// Match with the default thresholds.
pub fn is_match(a: &str, b: &str) -> bool {
    NameMatcher::default().is_match(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_core_match() {
        let m = NameMatcher::default();
        assert_eq!(
            m.strategy("**Jane Roe**", "jane  roe"),
            Some(MatchStrategy::Exact)
        );
        assert_eq!(m.strategy("", ""), None);
        assert_eq!(m.strategy("()", "[]"), None);
    }

    #[test]
    fn test_containment() {
        let m = NameMatcher::default();
        assert_eq!(
            m.strategy("Atlas Holdings Inc.", "Atlas Holdings"),
            Some(MatchStrategy::Containment)
        );
        // shorter core name "sail" is not longer than 4
        assert_eq!(m.strategy("SAIL", "SAIL Corp"), None);
        // "ai" is far too short to count
        assert!(!m.is_match("AI", "SAIL Corp"));
    }

    #[test]
    fn test_edit_distance() {
        let m = NameMatcher::default();
        // distance 1 over 13 chars
        assert_eq!(
            m.strategy("Jon Smithson", "John Smithson"),
            Some(MatchStrategy::EditDistance)
        );
        // distance 1 over 6 chars: ratio 0.17
        assert!(m.is_match("Brandt", "Brandy"));
        // distance 3 over 6 chars
        assert!(!m.is_match("Brandt", "Bronte"));
    }

    #[test]
    fn test_token_jaccard() {
        let m = NameMatcher::default();
        // {bank, of, north, atlantic} vs {north, atlantic, bank}: 3/4
        assert_eq!(
            m.strategy("Bank of North Atlantic", "North Atlantic Bank"),
            Some(MatchStrategy::TokenJaccard)
        );
        // {red, river, llc} vs {blue, river, llc}: 2/4
        assert!(!m.is_match("Red River LLC", "Blue River LLC"));
    }

    #[test]
    fn test_first_strategy_wins() {
        let m = NameMatcher::default();
        // Also within edit distance, but containment is checked first.
        assert_eq!(
            m.strategy("ACorp Global", "ACorp Globale"),
            Some(MatchStrategy::Containment)
        );
    }

    #[test]
    fn test_jaccard_empty() {
        let empty = BTreeSet::new();
        let some: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        assert_eq!(jaccard(&empty, &some), None);
        assert_eq!(jaccard(&some, &some), Some(1.0));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let strict = NameMatcher::new(
            ResolutionConfig::new()
                .with_edit_ratio_threshold(0.0)
                .with_jaccard_threshold(1.0),
        );
        assert!(!strict.is_match("Jon Smithson", "John Smithson"));
        assert!(is_match("Jon Smithson", "John Smithson"));
    }
}
