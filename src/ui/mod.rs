//! User interface module - human-readable status output.
//!
//! Everything here is display only; diagnostics go through `tracing`.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_outcome, display_plan, display_signals, display_status,
    display_success, outcome_summary,
};
