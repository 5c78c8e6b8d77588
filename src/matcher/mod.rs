//! Pattern validation, matching and cost estimation for Ethereum addresses.
//!
//! - Prefix: match right after `0x`
//! - Suffix: match at the end of the address
//! - Both: each configured end must hold

mod estimate;
mod pattern;
mod validate;

pub use estimate::{
    estimate, format_time_label, DifficultyTier, Estimator, ProbabilityEstimate,
    DEFAULT_THROUGHPUT,
};
pub use pattern::{pattern_examples, MatchResult, Pattern};
pub use validate::{
    invalid_chars, validate_field, validate_pattern, PatternError, PatternField, ValidationResult,
};
