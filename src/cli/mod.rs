//! Glue between command-line arguments and the library
pub mod orchestration;

pub use orchestration::{build_reconciler, resolve_config, run_bump, BumpArgs, Request};
