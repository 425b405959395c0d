//! leadflow - CLI for live, role-scoped record collections.
//!
//! A thin wrapper over `leadflow-core` for creating, watching and moving
//! records through their statuses from a terminal.

mod cli;
mod commands;
mod output;
mod profile;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match commands::handle(cli.command, cli.store.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print a failure. Store errors get their generic notice first; the full
/// chain follows for context.
fn report(err: &anyhow::Error) {
    if let Some(store_err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<leadflow_core::Error>())
    {
        output::error(store_err.user_notice());
    }
    output::error(&format!("{:#}", err));
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
