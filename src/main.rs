// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! `retail-lister` binary
//!
//! Lists one back-office resource (products, groups, categories or
//! warehouses) and writes every record to stdout as one JSON document per
//! line. The `login` command opens a session and prints its key instead.
//!
//! Logs go to stderr at INFO, or DEBUG with `-v`; `RUST_LOG` adds
//! directives on top. The exit status is non-zero when the command fails
//! or any page of a listing failed.

use anyhow::Context;
use clap::Parser;
use retail_lister::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let command = cli.command.name();
    Runner::new(cli)
        .run()
        .await
        .with_context(|| format!("retail-lister {command} failed"))
}
