//! Binary crate for the `weather-conformance` runner.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring config, client, listener and suite together
//! - Mapping the suite outcome to the process exit code

use std::process::ExitCode;

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
