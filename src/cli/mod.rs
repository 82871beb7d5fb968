//! CLI module
//!
//! Command-line interface for listing resources.
//!
//! # Commands
//!
//! - `login` - Open a session and print its key
//! - `list` - Stream every record of a resource as JSON

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, Resource};
pub use runner::{ListOptions, ListSummary, Runner};
