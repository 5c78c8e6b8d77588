//! Ethereum Vanity Address Search CLI
//!
//! Usage:
//!   eth-vanity -p dead                  # Find an address starting with 0xdead
//!   eth-vanity -s beef -c               # Ending with "beef" in checksum casing
//!   eth-vanity -p cafe -n 5 -o file     # Find 5 and write a report file
//!   eth-vanity -p abcd -w 0             # Use every CPU core

use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use eth_vanity_search::matcher::pattern_examples;
use eth_vanity_search::report;
use eth_vanity_search::{Config, Engine, Match, Outcome, ProgressSnapshot, SearchEvent, Summary};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let params = match config.search_params() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let estimate = config.estimator().estimate(
        &config.prefix,
        &config.suffix,
        config.count as u64,
        config.case_sensitive,
    );

    println!("Ethereum Vanity Address Search");
    println!("==============================");
    println!("Criteria:   {}", params.pattern.criteria());
    for example in pattern_examples(&config.prefix, &config.suffix) {
        println!("Example:    {}", example);
    }
    println!("Difficulty: {}", estimate.difficulty);
    println!("Expected:   {} attempts", format_number(estimate.expected_attempts));
    println!("Estimate:   {}", estimate.estimated_time_label);
    match config.worker_count() {
        Some(n) => println!("Workers:    {}", n),
        None => println!("Workers:    1 (cooperative)"),
    }
    println!("Target:     {} address(es)", config.count);
    println!();

    let engine = Engine::new();
    let ctrlc_engine = engine.clone();
    if let Err(e) = ctrlc::set_handler(move || ctrlc_engine.cancel()) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let started = match config.worker_count() {
        Some(workers) => engine.spawn_parallel(params, workers),
        None => engine.spawn(params),
    };
    let handle = match started {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to start search: {}", e);
            process::exit(1);
        }
    };

    println!("Searching... (Press Ctrl+C to stop)\n");

    let report_interval = config.report_interval();
    let deadline = config.max_time().map(|limit| Instant::now() + limit);
    let mut last_report = Instant::now();

    loop {
        match handle.next_event(Duration::from_millis(200)) {
            Ok(SearchEvent::Match(found)) => print_result(&found),
            Ok(SearchEvent::Progress(progress)) => {
                if last_report.elapsed() >= report_interval {
                    print_progress(&progress);
                    last_report = Instant::now();
                }
            }
            Ok(SearchEvent::Finished(_)) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if deadline.is_some_and(|d| Instant::now() >= d) && !handle.is_finished() {
            warn!("time limit reached, cancelling search");
            handle.cancel();
        }
    }

    let summary = match handle.join() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Search failed: {}", e);
            process::exit(1);
        }
    };

    print_summary(&summary);

    if config.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize summary: {}", e),
        }
    }

    if let Some(path) = config.report_path() {
        if !summary.no_matches() {
            match report::write(&summary, &path) {
                Ok(()) => println!("Report written to {}", path.display()),
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn print_result(found: &Match) {
    println!("=== Match #{} ===", found.ordinal);
    println!("Address:     {}", found.address());
    println!("Private Key: {}", found.private_key_hex());
    println!();
}

fn print_progress(progress: &ProgressSnapshot) {
    let rate = if progress.elapsed_secs > 0.0 {
        progress.checked as f64 / progress.elapsed_secs
    } else {
        0.0
    };
    println!(
        "[{:>4}s] Found {}/{}, checked {} keys ({}/s)",
        progress.elapsed_secs as u64,
        progress.found,
        progress.total,
        format_number(progress.checked),
        format_number(rate as u64)
    );
}

fn print_summary(summary: &Summary) {
    println!();
    match summary.outcome {
        Outcome::Completed => println!(
            "Target reached! Found {} address(es).",
            summary.found()
        ),
        Outcome::Cancelled => println!("Stopped by user."),
        Outcome::AttemptsExhausted => println!("Attempt limit reached."),
    }
    if summary.no_matches() {
        println!("No addresses matched the criteria.");
    } else if summary.is_partial() {
        println!(
            "Found {} out of {} requested addresses.",
            summary.found(),
            summary.target_count
        );
    }

    println!("\n--- Final Statistics ---");
    println!("Criteria:             {}", summary.criteria);
    println!("Total keys checked:   {}", format_number(summary.total_checked));
    println!("Total matches found:  {}", summary.found());
    println!("Time elapsed:         {}", report::format_elapsed(summary.elapsed));
    println!(
        "Average speed:        {}/s",
        format_number(summary.keys_per_second() as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}
