//! Invokable actions behind the CLI.
//!
//! Each command takes typed arguments, calls one component and prints either
//! a human summary or a `{"ok": true, "data": ...}` JSON envelope. Per-item
//! failures are part of the payload; only call-level failures become `Err`.

mod documents;
mod filesystem;
mod report;

use crate::cli::Commands;
use crate::config::Settings;
use crate::error::{Error, Result};
use serde::Serialize;

/// What every command needs besides its own arguments
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub json: bool,
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct JsonErr<'a> {
    ok: bool,
    error: &'a Error,
}

pub async fn dispatch(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Extract { folder } => filesystem::extract(ctx, &folder).await,
        Commands::Duplicate {
            source,
            destination,
            verify,
        } => filesystem::duplicate(ctx, &source, &destination, verify).await,
        Commands::Rename {
            folder,
            dry_run,
            locale,
            month,
        } => filesystem::rename(ctx, &folder, dry_run, locale, month).await,
        Commands::Render {
            template,
            content,
            output,
        } => documents::render(ctx, &template, &content, output).await,
        Commands::Inspect { template } => documents::inspect(ctx, &template).await,
        Commands::Report {
            report,
            content,
            output,
        } => report::report(ctx, &report, &content, output).await,
        Commands::Sources { folder } => report::sources(ctx, &folder).await,
        Commands::Prompt { report, folder } => report::prompt(ctx, &report, &folder),
        Commands::Weather { location } => report::weather(ctx, &location).await,
    }
}

/// Print `data` as JSON or through the human `render` closure
pub(crate) fn print_one<T: Serialize>(
    json: bool,
    data: &T,
    render: impl Fn(&T) -> String,
) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", render(data));
    }
    Ok(())
}

/// Print a call-level error in the same envelope
pub fn print_error(json: bool, err: &Error) {
    if json {
        match serde_json::to_string_pretty(&JsonErr { ok: false, error: err }) {
            Ok(text) => println!("{}", text),
            Err(_) => eprintln!("error: {}", err),
        }
    } else {
        eprintln!("error: {}", err);
    }
}

/// Run blocking filesystem work off the async runtime
pub(crate) async fn blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::Task {
            message: format!("Task panicked: {}", e),
        })?
}
