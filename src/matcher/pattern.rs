//! Pattern matching implementation.

use std::fmt;

use serde::Serialize;

use crate::crypto::Address;

use super::validate::{validate_pattern, PatternError};

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

impl From<bool> for MatchResult {
    fn from(matched: bool) -> Self {
        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }
}

/// A validated prefix/suffix pattern.
///
/// An empty prefix or suffix leaves that end of the address unconstrained.
/// Both ends must hold when both are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern {
    /// Prefix as entered (matched against the address after `0x`)
    prefix: String,
    /// Suffix as entered
    suffix: String,
    /// Whether matching is case sensitive
    case_sensitive: bool,
    #[serde(skip)]
    folded_prefix: String,
    #[serde(skip)]
    folded_suffix: String,
}

impl Pattern {
    /// Validates and builds a pattern.
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<Self, PatternError> {
        let prefix = prefix.into();
        let suffix = suffix.into();
        validate_pattern(&prefix, &suffix).into_result()?;

        let fold = |s: &str| {
            if case_sensitive {
                s.to_owned()
            } else {
                s.to_ascii_lowercase()
            }
        };

        Ok(Self {
            folded_prefix: fold(&prefix),
            folded_suffix: fold(&suffix),
            prefix,
            suffix,
            case_sensitive,
        })
    }

    /// A pattern that accepts every address.
    pub fn any() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            case_sensitive: false,
            folded_prefix: String::new(),
            folded_suffix: String::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Number of constrained hex characters.
    pub fn len(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matches an address against this pattern.
    ///
    /// Case-sensitive patterns compare against the EIP-55 checksum text,
    /// case-insensitive ones against the lowercase hex body.
    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        if self.is_empty() {
            return MatchResult::Match;
        }
        let body = if self.case_sensitive {
            address.checksum_body()
        } else {
            address.to_hex()
        };
        self.matches_body(&body)
    }

    /// Matches a `0x`-prefixed address string.
    pub fn matches_str(&self, address: &str) -> MatchResult {
        let body = address.strip_prefix("0x").unwrap_or(address);
        if self.case_sensitive {
            self.matches_body(body)
        } else {
            self.matches_body(&body.to_ascii_lowercase())
        }
    }

    fn matches_body(&self, body: &str) -> MatchResult {
        (body.starts_with(&self.folded_prefix) && body.ends_with(&self.folded_suffix)).into()
    }

    /// Search-criteria line used in summaries and reports.
    pub fn criteria(&self) -> String {
        let mut out = String::new();
        if !self.prefix.is_empty() {
            out.push_str(&format!("Prefix: \"{}\"", self.prefix));
        }
        if !self.suffix.is_empty() {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(&format!("Suffix: \"{}\"", self.suffix));
        }
        if out.is_empty() {
            out.push_str("Any address");
        }
        out.push_str(if self.case_sensitive {
            " (case-sensitive)"
        } else {
            " (case-insensitive)"
        });
        out
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.prefix.is_empty(), self.suffix.is_empty()) {
            (true, true) => write!(f, "0x..."),
            (false, true) => write!(f, "0x{}...", self.prefix),
            (true, false) => write!(f, "0x...{}", self.suffix),
            (false, false) => write!(f, "0x{}...{}", self.prefix, self.suffix),
        }
    }
}

/// Illustrative address shapes for a prefix/suffix pair.
pub fn pattern_examples(prefix: &str, suffix: &str) -> Vec<String> {
    match (prefix.is_empty(), suffix.is_empty()) {
        (false, false) => vec![
            format!("0x{}...{}", prefix, suffix),
            format!("0x{}123abc...789{}", prefix, suffix),
        ],
        (false, true) => vec![
            format!("0x{}...", prefix),
            format!("0x{}123abc789def...", prefix),
        ],
        (true, false) => vec![
            format!("0x...{}", suffix),
            format!("0x123abc789def...{}", suffix),
        ],
        (true, true) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_address(hex_str: &str) -> Address {
        let bytes: [u8; 20] = hex::decode(hex_str).unwrap().try_into().unwrap();
        Address::from_bytes(bytes)
    }

    #[test]
    fn test_prefix_match() {
        let pattern = Pattern::new("dead", "", false).unwrap();
        let addr = make_address("deadbeef00000000000000000000000000000000");
        assert!(pattern.matches(&addr).is_match());
    }

    #[test]
    fn test_prefix_no_match() {
        let pattern = Pattern::new("dead", "", false).unwrap();
        let addr = make_address("beefdeadbeef0000000000000000000000000000");
        assert!(!pattern.matches(&addr).is_match());
    }

    #[test]
    fn test_suffix_match() {
        let pattern = Pattern::new("", "BEEF", false).unwrap();
        let addr = make_address("0000000000000000000000000000000000debeef");
        assert!(pattern.matches(&addr).is_match());
    }

    #[test]
    fn test_prefix_and_suffix_both_required() {
        let pattern = Pattern::new("dead", "beef", false).unwrap();
        assert!(pattern
            .matches(&make_address("dead00000000000000000000000000000000beef"))
            .is_match());
        assert!(!pattern
            .matches(&make_address("dead000000000000000000000000000000000000"))
            .is_match());
        assert!(!pattern
            .matches(&make_address("000000000000000000000000000000000000beef"))
            .is_match());
    }

    #[test]
    fn test_case_sensitive_uses_checksum_casing() {
        // 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed
        let addr = make_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert!(Pattern::new("5aAe", "", true).unwrap().matches(&addr).is_match());
        assert!(!Pattern::new("5aae", "", true).unwrap().matches(&addr).is_match());
        assert!(Pattern::new("5aae", "", false).unwrap().matches(&addr).is_match());
        assert!(Pattern::new("", "BeAed", true).unwrap().matches(&addr).is_match());
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let pattern = Pattern::new("", "", true).unwrap();
        assert!(pattern.matches(&make_address("ffffffffffffffffffffffffffffffffffffffff")).is_match());
        assert!(Pattern::any().matches(&Address::from_bytes([7; 20])).is_match());
    }

    #[test]
    fn test_matches_str() {
        let pattern = Pattern::new("AB", "", false).unwrap();
        assert!(pattern.matches_str("0xab00000000000000000000000000000000000000").is_match());
        assert!(!Pattern::new("AB", "", true)
            .unwrap()
            .matches_str("0xab00000000000000000000000000000000000000")
            .is_match());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(Pattern::new("xyz", "", false).is_err());
        assert!(Pattern::new("", "0g", false).is_err());
    }

    #[test]
    fn test_criteria() {
        assert_eq!(
            Pattern::new("dead", "beef", false).unwrap().criteria(),
            "Prefix: \"dead\", Suffix: \"beef\" (case-insensitive)"
        );
        assert_eq!(
            Pattern::new("", "Ab", true).unwrap().criteria(),
            "Suffix: \"Ab\" (case-sensitive)"
        );
    }

    #[test]
    fn test_examples() {
        assert_eq!(pattern_examples("ab", ""), vec!["0xab...", "0xab123abc789def..."]);
        assert!(pattern_examples("", "").is_empty());
        assert_eq!(Pattern::new("ab", "cd", true).unwrap().to_string(), "0xab...cd");
    }
}
