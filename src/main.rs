//! # Strata Command-Line Entry Point
//!
//! ```bash
//! strata run --profile institution --input cc_institution_details.csv
//! strata run --profile placement --input Placement_Data_Full_Class.csv --json
//! strata profile show placement
//! strata settings show
//! ```
//!
//! Logs go to stderr (`RUST_LOG=debug` for detail); results go to stdout.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let settings = cli::resolve_settings(&cli)?;

    strata::logging::init(settings.log_dir.as_deref())?;
    tracing::debug!(?settings, "Effective settings");

    cli::run_command(cli.command, &settings)
}
