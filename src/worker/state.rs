//! Per-run search state and the values reported to callers.

use std::fmt;
use std::time::{Duration, Instant};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::crypto::Keypair;
use crate::matcher::Pattern;

/// A keypair that satisfied the pattern, numbered from 1 in the order found.
#[derive(Debug, Clone)]
pub struct Match {
    pub ordinal: usize,
    pub keypair: Keypair,
}

impl Match {
    /// Checksummed address with `0x` prefix.
    pub fn address(&self) -> String {
        self.keypair.address().to_checksum()
    }

    pub fn private_key_hex(&self) -> String {
        self.keypair.private_key_hex()
    }
}

impl Serialize for Match {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Match", 3)?;
        s.serialize_field("index", &self.ordinal)?;
        s.serialize_field("address", self.keypair.address())?;
        s.serialize_field("private_key", &self.private_key_hex())?;
        s.end()
    }
}

/// Point-in-time copy of run progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub found: usize,
    pub total: usize,
    pub checked: u64,
    pub elapsed_secs: f64,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The requested number of matches was found.
    Completed,
    /// The caller cancelled the run.
    Cancelled,
    /// The attempt ceiling was reached first.
    AttemptsExhausted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "Completed"),
            Outcome::Cancelled => write!(f, "Cancelled"),
            Outcome::AttemptsExhausted => write!(f, "Attempts exhausted"),
        }
    }
}

/// Terminal report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub criteria: String,
    pub target_count: usize,
    pub total_checked: u64,
    /// Attempts whose keypair derivation failed (included in `total_checked`).
    pub skipped: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub matches: Vec<Match>,
    pub outcome: Outcome,
}

fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl Summary {
    pub fn found(&self) -> usize {
        self.matches.len()
    }

    /// True when the run ended without a single match.
    pub fn no_matches(&self) -> bool {
        self.matches.is_empty()
    }

    /// True when the run ended with fewer matches than requested.
    pub fn is_partial(&self) -> bool {
        !self.matches.is_empty() && self.matches.len() < self.target_count
    }

    pub fn keys_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_checked as f64 / secs
        } else {
            0.0
        }
    }
}

/// Everything that changes during a run. Owned by exactly one loop.
#[derive(Debug)]
pub struct SearchState {
    matches: Vec<Match>,
    attempts: u64,
    skipped: u64,
    target_count: usize,
    started_at: Instant,
    cancelled: bool,
}

impl SearchState {
    pub fn new(target_count: usize) -> Self {
        Self {
            matches: Vec::with_capacity(target_count.min(1024)),
            attempts: 0,
            skipped: 0,
            target_count,
            started_at: Instant::now(),
            cancelled: false,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn found(&self) -> usize {
        self.matches.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_satisfied(&self) -> bool {
        self.matches.len() >= self.target_count
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Folds in counters maintained elsewhere. Never moves them backwards.
    pub fn observe_counts(&mut self, attempts: u64, skipped: u64) {
        self.attempts = self.attempts.max(attempts);
        self.skipped = self.skipped.max(skipped);
    }

    /// Appends a match unless the run is cancelled or already satisfied.
    pub fn record_match(&mut self, keypair: Keypair) -> Option<&Match> {
        if self.cancelled || self.is_satisfied() {
            return None;
        }
        self.matches.push(Match {
            ordinal: self.matches.len() + 1,
            keypair,
        });
        self.matches.last()
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            found: self.matches.len(),
            total: self.target_count,
            checked: self.attempts,
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub fn finish(self, pattern: &Pattern) -> Summary {
        let outcome = if self.cancelled {
            Outcome::Cancelled
        } else if self.is_satisfied() {
            Outcome::Completed
        } else {
            Outcome::AttemptsExhausted
        };

        Summary {
            criteria: pattern.criteria(),
            target_count: self.target_count,
            total_checked: self.attempts,
            skipped: self.skipped,
            elapsed: self.started_at.elapsed(),
            matches: self.matches,
            outcome,
        }
    }
}

/// Item of a run's event stream. `Finished` is always the last event.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Progress(ProgressSnapshot),
    Match(Match),
    Finished(Summary),
}
