//! Hex pattern validation.
//!
//! The same checks back both live input feedback ([`validate_field`]) and
//! the pre-submission gate ([`validate_pattern`]).

use std::fmt;

/// Which end of the address a pattern string constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternField {
    Prefix,
    Suffix,
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternField::Prefix => write!(f, "Prefix"),
            PatternField::Suffix => write!(f, "Suffix"),
        }
    }
}

/// Outcome of validating a prefix/suffix pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Distinct offending characters, in first-seen order.
    Invalid {
        field: PatternField,
        offending: Vec<char>,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn into_result(self) -> Result<(), PatternError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { field, offending } => {
                Err(PatternError::InvalidCharacters { field, offending })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error(
        "{field} contains invalid characters: {}. Only 0-9, a-f, A-F are allowed.",
        join_chars(.offending)
    )]
    InvalidCharacters {
        field: PatternField,
        offending: Vec<char>,
    },
}

fn join_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Distinct non-hex characters of `value`, in first-seen order.
pub fn invalid_chars(value: &str) -> Vec<char> {
    let mut invalid = Vec::new();
    for c in value.chars() {
        if !c.is_ascii_hexdigit() && !invalid.contains(&c) {
            invalid.push(c);
        }
    }
    invalid
}

/// Validates a single field. Empty input is valid.
pub fn validate_field(value: &str, field: PatternField) -> Result<(), PatternError> {
    let offending = invalid_chars(value);
    if offending.is_empty() {
        Ok(())
    } else {
        Err(PatternError::InvalidCharacters { field, offending })
    }
}

/// Validates a prefix/suffix pair, reporting the prefix first.
pub fn validate_pattern(prefix: &str, suffix: &str) -> ValidationResult {
    let checked = validate_field(prefix, PatternField::Prefix)
        .and_then(|()| validate_field(suffix, PatternField::Suffix));
    match checked {
        Ok(()) => ValidationResult::Valid,
        Err(PatternError::InvalidCharacters { field, offending }) => {
            ValidationResult::Invalid { field, offending }
        }
    }
}
