//! Name canonicalization.
//!
//! Reports spell the same entity many ways: `**Atlas Holdings**`,
//! `Atlas Holdings Inc.`, `Atlas Holdings (subsidiary)`. Everything in this
//! module is pure and total; empty or garbage input yields empty output.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Markdown emphasis and code markers left behind by report rendering.
const MARKDOWN_MARKERS: &[char] = &['*', '_', '~', '`'];

/// Punctuation dropped from comparison keys.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}',
];

fn qualifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Literal pattern; compilation cannot fail.
    PATTERN.get_or_init(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for a raw name.
///
/// Lowercases, drops markdown markers, parenthetical and bracketed
/// qualifiers, and punctuation, then collapses whitespace.
pub fn core_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let unmarked: String = lowered
        .chars()
        .filter(|c| !MARKDOWN_MARKERS.contains(c))
        .collect();
    let unqualified = qualifier_pattern().replace_all(&unmarked, " ");
    let unpunctuated: String = unqualified
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    collapse_whitespace(&unpunctuated)
}

/// Whitespace-separated tokens of [`core_name`].
pub fn tokens(raw: &str) -> BTreeSet<String> {
    core_name(raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Stable id fragment for graph nodes: lowercase alphanumerics only.
///
/// Not a matching key. Names that differ only in punctuation or spacing
/// ("A.B. Corp" / "AB Corp") collapse onto the same id, and that is
/// accepted behavior.
pub fn normalize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Display form of a mention: markdown markers removed, whitespace tidied,
/// original casing and qualifiers kept.
pub fn clean_display(raw: &str) -> String {
    let unmarked: String = raw.chars().filter(|c| !MARKDOWN_MARKERS.contains(c)).collect();
    collapse_whitespace(&unmarked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_name_strips_noise() {
        assert_eq!(core_name("**Atlas Holdings Inc.**"), "atlas holdings inc");
        assert_eq!(core_name("  Jane   ROE "), "jane roe");
        assert_eq!(core_name("Acme (formerly Apex) [unverified]"), "acme");
        assert_eq!(core_name("`Shadow_Corp`"), "shadowcorp");
        assert_eq!(core_name("O'Brien, Patrick"), "obrien patrick");
    }

    #[test]
    fn test_core_name_is_total() {
        assert_eq!(core_name(""), "");
        assert_eq!(core_name("   "), "");
        assert_eq!(core_name("(only a qualifier)"), "");
        assert_eq!(core_name("***"), "");
    }

    #[test]
    fn test_tokens() {
        let t = tokens("Atlas Holdings (Cayman) Inc.");
        let expected: BTreeSet<String> = ["atlas", "holdings", "inc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(t, expected);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("Shadow Corp."), "shadowcorp");
        assert_eq!(normalize_id("A.B. Corp"), normalize_id("AB Corp"));
        assert_eq!(normalize_id("--"), "");
    }

    #[test]
    fn test_clean_display_keeps_casing() {
        assert_eq!(clean_display("  **Atlas   Holdings** Inc. "), "Atlas Holdings Inc.");
        assert_eq!(clean_display("__"), "");
    }
}
