//! `userbook` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Own the store lifecycle: open on startup, close on shutdown.
//! - Print operation results as JSON; map failures to exit codes.

mod args;
mod commands;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use userbook_core::{close_db, default_log_level, init_logging, open_db};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    };
    // The logger lives in a static and is never dropped.
    log::logger().flush();
    code
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, absolute(log_dir)?).context("failed to initialize logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open store `{}`", cli.db.display()))?;
    let outcome = commands::execute(&conn, cli.command);
    close_db(conn).context("failed to close store")?;

    match outcome? {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let body = json!({ "error": err.to_string(), "code": err.code() });
            eprintln!("{body}");
            Ok(ExitCode::from(commands::exit_code(&err)))
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve working directory")?;
    Ok(cwd.join(path))
}
