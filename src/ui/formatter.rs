//! Pure formatting functions for UI output.
//!
//! Functions here have no side effects beyond printing. The text they print
//! is built by separate functions so it can be tested without a terminal.

use console::style;

use crate::ci::Signal;
use crate::reconcile::{BumpOutcome, Completion};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display the proposed version change.
///
/// # Arguments
/// * `current` - Version currently in the primary manifest
/// * `candidate` - Version the request will write
pub fn display_plan(current: &str, candidate: &str) {
    println!("\n{}", style("Proposed Version Change:").bold());
    println!("  From: {}", style(current).red());
    println!("  To:   {}", style(candidate).green());
}

/// Display report-mode signals, one `KEY=VALUE` per line.
pub fn display_signals(signals: &[Signal]) {
    for signal in signals {
        let value = if signal.value == "TRUE" {
            style(signal.value.as_str()).green()
        } else {
            style(signal.value.as_str()).yellow()
        };
        println!("  {}={}", signal.key, value);
    }
}

/// One-line summary of where a request stopped.
pub fn outcome_summary(outcome: &BumpOutcome) -> String {
    match outcome.completion {
        Completion::CurrentValidated => {
            format!("Version {} passed every check", outcome.version)
        }
        Completion::DryRun => format!(
            "Dry run: would bump {} --> {}",
            outcome.previous, outcome.version
        ),
        Completion::Written => format!(
            "Wrote {} to {} manifest(s), git state untouched",
            outcome.version,
            outcome.written.len()
        ),
        Completion::Unchanged => {
            format!("Manifests already at {}, nothing to commit", outcome.version)
        }
        Completion::Committed if outcome.pushed => format!(
            "Bumped {} --> {}, tagged and pushed",
            outcome.previous, outcome.version
        ),
        Completion::Committed => format!(
            "Bumped {} --> {} and tagged locally",
            outcome.previous, outcome.version
        ),
    }
}

/// Display the result of a request: written files, signals and summary.
pub fn display_outcome(outcome: &BumpOutcome) {
    for path in &outcome.written {
        display_status(&format!("Updated {}", path.display()));
    }
    if !outcome.signals.is_empty() {
        println!("{}", style("Signals:").bold());
        display_signals(&outcome.signals);
    }
    display_success(&outcome_summary(outcome));
}
