//! Plain-text export of a finished run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::worker::Summary;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("nothing to export: the run found no addresses")]
    Empty,

    #[error("failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Elapsed time as `Ns` below a minute, `Mm Ss` otherwise.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Attempts per second, rounded. Zero when no time elapsed.
pub fn speed(summary: &Summary) -> u64 {
    summary.keys_per_second().round() as u64
}

/// Renders the report: summary block followed by every match in order.
pub fn render(summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str("Ethereum Address Generator - Results\n");
    out.push_str("====================================\n\n");

    out.push_str("GENERATION SUMMARY\n");
    out.push_str("------------------\n");
    out.push_str(&format!("Search Criteria: {}\n", summary.criteria));
    out.push_str(&format!("Outcome: {}\n", summary.outcome));
    out.push_str(&format!("Addresses Found: {}\n", summary.found()));
    out.push_str(&format!("Total Addresses Scanned: {}\n", summary.total_checked));
    if summary.skipped > 0 {
        out.push_str(&format!("Skipped Attempts: {}\n", summary.skipped));
    }
    out.push_str(&format!("Total Time: {}\n", format_elapsed(summary.elapsed)));
    out.push_str(&format!("Speed: {} addresses/second\n\n", speed(summary)));

    out.push_str("RESULTS\n");
    out.push_str("-------\n");
    for m in &summary.matches {
        out.push_str(&format!("Address {}: {}\n", m.ordinal, m.address()));
        out.push_str(&format!("Private Key {}: {}\n\n", m.ordinal, m.private_key_hex()));
    }
    out
}

/// `ethereum_addresses_<unix-seconds>.txt`
pub fn default_file_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("ethereum_addresses_{}.txt", secs)
}

/// Writes the report to `path`. Runs without matches are not exported.
pub fn write(summary: &Summary, path: &Path) -> Result<(), ReportError> {
    if summary.no_matches() {
        return Err(ReportError::Empty);
    }
    fs::write(path, render(summary)).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
