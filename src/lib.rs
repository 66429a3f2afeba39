pub mod ci;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod manifest;
pub mod reconcile;
pub mod sources;
pub mod ui;

pub use error::{BumpyError, Result};
