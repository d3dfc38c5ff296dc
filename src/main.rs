//! Binary entry point for atemplateb.
//!
//! This binary provides the CLI interface for rendering configuration files.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::process::ExitCode;

use atemplateb::cli::Cli;
use atemplateb::observability;
use clap::Parser;

/// Main entry point.
fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --version and --help print to stdout and succeed.
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        },
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_env(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match cli.into_render_command() {
        Ok(command) => commands::cmd_render(&command),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
