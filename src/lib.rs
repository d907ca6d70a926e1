pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod fileops;
pub mod lexicon;
pub mod models;
pub mod pipeline;
pub mod template;
pub mod weather;

#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::Cli;
use commands::Context;
use config::Settings;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    // Load .env from the working directory, then its parent
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Default: warn for most crates, info for ours (per-call summaries visible)
    // Use RUST_LOG=debug for per-file logs. Logs go to stderr so --json stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,report_kit_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            commands::print_error(json, &e.into());
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let err = error::Error::Task {
                message: format!("Failed to start async runtime: {}", e),
            };
            commands::print_error(json, &err);
            return ExitCode::FAILURE;
        }
    };

    let ctx = Context { settings, json };
    match runtime.block_on(commands::dispatch(cli.command, &ctx)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            commands::print_error(json, &e);
            ExitCode::FAILURE
        }
    }
}
