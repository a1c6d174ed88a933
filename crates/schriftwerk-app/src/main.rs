// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schriftwerk — image-to-text extraction with a policy-gated file layer and
// an append-only audit trail.
//
// Entry point. Initialises logging on stderr, parses the command line, and
// hands over to the command dispatcher.

mod cli;
mod commands;
mod services;
mod usecases;

use std::process::ExitCode;

use clap::Parser;
use schriftwerk_core::human_errors::humanize_error;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::Status;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Schriftwerk starting");

    let mut stdout = std::io::stdout().lock();
    match commands::run(cli, &mut stdout) {
        Ok(Status::Success) => ExitCode::SUCCESS,
        Ok(Status::Partial) => ExitCode::from(2),
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}", humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}
