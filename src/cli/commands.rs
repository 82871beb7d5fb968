//! CLI commands and argument parsing

use crate::types::{parse_filter, JsonValue};
use chrono::{DateTime, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concurrent lister for the retail back-office API
#[derive(Parser, Debug)]
#[command(name = "retail-lister")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Account code, overrides the config file
    #[arg(long, global = true)]
    pub client_code: Option<String>,

    /// Session key, overrides the config file
    #[arg(long, global = true)]
    pub session_key: Option<String>,

    /// Endpoint override
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a session and print its key
    Login {
        /// User name, overrides the config file
        #[arg(long)]
        username: Option<String>,

        /// Password, overrides the config file
        #[arg(long)]
        password: Option<String>,
    },

    /// List every record of a resource
    List {
        /// Resource to list
        resource: Resource,

        /// Filter passed to the API as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter_arg)]
        filters: Vec<(String, JsonValue)>,

        /// Only records changed since this RFC 3339 time or YYYY-MM-DD date
        #[arg(long, value_parser = parse_changed_since)]
        changed_since: Option<i64>,

        /// Request ceiling per second
        #[arg(long)]
        max_rps: Option<u32>,

        /// Records per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Size of the fetcher pool
        #[arg(long)]
        fetchers: Option<u32>,

        /// Capacity of the output stream
        #[arg(long)]
        buffer: Option<usize>,

        /// Stop on the first page error
        #[arg(long)]
        fail_fast: bool,

        /// Deadline of the whole listing, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<usize>,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::List { .. } => "list",
        }
    }
}

/// Listable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Resource {
    /// Products
    Products,
    /// Product priority groups
    PriorityGroups,
    /// Product groups
    ProductGroups,
    /// Product categories
    Categories,
    /// Warehouses
    Warehouses,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Human-readable output
    Pretty,
}

fn parse_filter_arg(arg: &str) -> std::result::Result<(String, JsonValue), String> {
    parse_filter(arg).ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))
}

/// Parse an RFC 3339 time or a plain date (midnight UTC) into a unix timestamp
pub(crate) fn parse_changed_since(arg: &str) -> std::result::Result<i64, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(arg) {
        return Ok(time.timestamp());
    }
    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc().timestamp())
        .ok_or_else(|| format!("expected an RFC 3339 time or YYYY-MM-DD date, got '{arg}'"))
}
