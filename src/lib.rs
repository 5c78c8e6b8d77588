//! # eth_vanity_search
//!
//! Ethereum vanity address search with live progress and cooperative
//! cancellation.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and address derivation
//! - `matcher`: Pattern validation, matching and cost estimation
//! - `worker`: The search engine, its events and the parallel variant
//! - `report`: Plain-text export of a finished run
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod report;
pub mod worker;

pub use config::{Config, ConfigError, OutputMode};
pub use crypto::{Address, KeyError, KeySource, Keypair, OsKeySource};
pub use matcher::{
    estimate, validate_field, validate_pattern, DifficultyTier, Estimator, MatchResult, Pattern,
    PatternError, PatternField, ProbabilityEstimate, ValidationResult,
};
pub use worker::{
    CancelToken, Engine, EngineError, Match, Outcome, ProgressSnapshot, SearchEvent,
    SearchHandle, SearchParams, Summary, YieldHook,
};
