//! Runtime configuration for the vanity address search.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::crypto::ADDRESS_HEX_LEN;
use crate::matcher::{validate_pattern, Estimator, Pattern, PatternError, DEFAULT_THROUGHPUT};
use crate::worker::{SearchParams, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS};

/// Largest number of addresses a single run may request.
pub const MAX_MATCH_COUNT: usize = 1000;

/// Where matches end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Print matches to the terminal
    #[default]
    Screen,
    /// Also write a plain-text report once the run ends
    File,
}

/// Ethereum Vanity Address Search
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix to match right after 0x (hex characters only: 0-9, a-f, A-F)
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Suffix to match at the end of the address
    #[arg(short, long, default_value = "")]
    pub suffix: String,

    /// Number of matching addresses to find (1-1000)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Match against the EIP-55 checksum casing
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = OutputMode::Screen)]
    pub output: OutputMode,

    /// Report path for file output (default: ethereum_addresses_<time>.txt)
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Give up after this many attempts
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u64,

    /// Attempts between progress updates
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u64,

    /// Assumed keys per second for the time estimate
    #[arg(long, default_value_t = DEFAULT_THROUGHPUT)]
    pub throughput: f64,

    /// Worker threads; omit for the single-threaded search, 0 for one per CPU
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Cancel the search after this many seconds
    #[arg(long)]
    pub max_time: Option<u64>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "1")]
    pub report_interval: u64,

    /// Print the final summary as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            count: 1,
            case_sensitive: false,
            output: OutputMode::Screen,
            output_file: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            batch_size: DEFAULT_BATCH_SIZE,
            throughput: DEFAULT_THROUGHPUT,
            workers: None,
            max_time: None,
            report_interval: 1,
            json: false,
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pattern(&self.prefix, &self.suffix).into_result()?;

        let total_len = self.prefix.len() + self.suffix.len();
        if total_len > ADDRESS_HEX_LEN {
            return Err(ConfigError::PatternTooLong(total_len));
        }

        if !(1..=MAX_MATCH_COUNT).contains(&self.count) {
            return Err(ConfigError::CountOutOfRange(self.count));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        if !(self.throughput.is_finite() && self.throughput > 0.0) {
            return Err(ConfigError::InvalidThroughput(self.throughput));
        }

        Ok(())
    }

    /// Builds the validated pattern.
    pub fn pattern(&self) -> Result<Pattern, ConfigError> {
        Ok(Pattern::new(
            self.prefix.clone(),
            self.suffix.clone(),
            self.case_sensitive,
        )?)
    }

    /// Builds the engine parameters for this configuration.
    pub fn search_params(&self) -> Result<SearchParams, ConfigError> {
        self.validate()?;
        Ok(SearchParams::new(self.pattern()?, self.count)
            .with_max_attempts(self.max_attempts)
            .with_batch_size(self.batch_size))
    }

    pub fn estimator(&self) -> Estimator {
        Estimator::new(self.throughput)
    }

    /// `None` for the single-threaded search, otherwise the thread count.
    pub fn worker_count(&self) -> Option<usize> {
        self.workers
            .map(|n| if n == 0 { num_cpus::get() } else { n })
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval.max(1))
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time.map(Duration::from_secs)
    }

    /// Report path when writing to a file.
    pub fn report_path(&self) -> Option<PathBuf> {
        match self.output {
            OutputMode::Screen => None,
            OutputMode::File => Some(
                self.output_file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(crate::report::default_file_name())),
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("combined prefix + suffix is {0} characters; an address has only 40")]
    PatternTooLong(usize),

    #[error("count must be between 1 and 1000, got {0}")]
    CountOutOfRange(usize),

    #[error("max attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("throughput must be a positive number, got {0}")]
    InvalidThroughput(f64),
}
