//! Command-line interface module
//!
//! Handles argument parsing and CLI commands

pub mod args;

pub use args::*;
