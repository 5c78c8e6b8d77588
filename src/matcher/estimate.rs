//! Search cost estimation.
//!
//! Estimates are display-only; they never influence a running search.
//!
//! Case-sensitive patterns are scored over a 22-symbol alphabet (digits plus
//! `a-f` and `A-F` counted separately). Checksum casing is not actually
//! uniform per character, so this overstates the true odds for letters; the
//! figure follows literal string matching instead.

use std::fmt;

use serde::Serialize;

/// Keys per second assumed when converting attempts into wall-clock time.
pub const DEFAULT_THROUGHPUT: f64 = 1500.0;

const CASE_SENSITIVE_ALPHABET: u32 = 22;
const CASE_INSENSITIVE_ALPHABET: u32 = 16;

/// Qualitative difficulty, a step function of pattern length only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DifficultyTier {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
    ExtremelyHard,
}

impl DifficultyTier {
    pub fn for_length(pattern_length: usize) -> Self {
        match pattern_length {
            0..=2 => DifficultyTier::VeryEasy,
            3 => DifficultyTier::Easy,
            4 => DifficultyTier::Medium,
            5 => DifficultyTier::Hard,
            6 => DifficultyTier::VeryHard,
            _ => DifficultyTier::ExtremelyHard,
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifficultyTier::VeryEasy => "Very Easy",
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Medium => "Medium",
            DifficultyTier::Hard => "Hard",
            DifficultyTier::VeryHard => "Very Hard",
            DifficultyTier::ExtremelyHard => "Extremely Hard",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityEstimate {
    /// Chance that a single attempt matches, in (0, 1].
    pub probability: f64,
    /// Expected attempts for all requested matches, saturating at `u64::MAX`.
    pub expected_attempts: u64,
    pub estimated_seconds: f64,
    pub estimated_time_label: String,
    pub difficulty: DifficultyTier,
}

/// Converts pattern shape into expected cost at a given throughput.
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    throughput: f64,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            throughput: DEFAULT_THROUGHPUT,
        }
    }
}

impl Estimator {
    /// `throughput` is in attempts per second and must be positive.
    pub fn new(throughput: f64) -> Self {
        Self { throughput }
    }

    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    pub fn estimate(
        &self,
        prefix: &str,
        suffix: &str,
        match_count: u64,
        case_sensitive: bool,
    ) -> ProbabilityEstimate {
        let alphabet = if case_sensitive {
            CASE_SENSITIVE_ALPHABET
        } else {
            CASE_INSENSITIVE_ALPHABET
        };
        let pattern_length = prefix.chars().count() + suffix.chars().count();

        let exponent = i32::try_from(pattern_length).unwrap_or(i32::MAX);
        let probability = f64::from(alphabet).powi(-exponent);

        // `as` saturates at u64::MAX for values out of range.
        let per_match = (1.0 / probability).round() as u64;
        let expected_attempts = per_match.max(1).saturating_mul(match_count.max(1));

        let estimated_seconds = (1.0 / probability) * match_count.max(1) as f64 / self.throughput;

        ProbabilityEstimate {
            probability,
            expected_attempts,
            estimated_seconds,
            estimated_time_label: format_time_label(estimated_seconds),
            difficulty: DifficultyTier::for_length(pattern_length),
        }
    }
}

/// Estimates cost at [`DEFAULT_THROUGHPUT`].
pub fn estimate(
    prefix: &str,
    suffix: &str,
    match_count: u64,
    case_sensitive: bool,
) -> ProbabilityEstimate {
    Estimator::default().estimate(prefix, suffix, match_count, case_sensitive)
}

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const MONTH: f64 = 2_592_000.0;
const YEAR: f64 = 31_536_000.0;

/// Coarse human label for an estimated duration.
pub fn format_time_label(seconds: f64) -> String {
    if seconds < 1.0 {
        return "Instant".into();
    }
    if seconds < MINUTE {
        return format!("~{} seconds", seconds.round());
    }

    let (amount, unit) = if seconds < HOUR {
        (seconds / MINUTE, "minute")
    } else if seconds < DAY {
        (seconds / HOUR, "hour")
    } else if seconds < MONTH {
        (seconds / DAY, "day")
    } else if seconds < YEAR {
        (seconds / MONTH, "month")
    } else {
        (seconds / YEAR, "year")
    };
    let amount = amount.round();
    let plural = if amount > 1.0 { "s" } else { "" };
    format!("~{} {}{}", amount, unit, plural)
}
