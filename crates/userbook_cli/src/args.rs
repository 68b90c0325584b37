//! Command-line arguments and configuration sources.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "userbook", version, about = "Manage user records in a local store")]
pub struct Cli {
    /// Path to the SQLite store file.
    #[arg(long, env = "USERBOOK_DB", default_value = "userbook.sqlite3", global = true)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error). Defaults by build mode.
    #[arg(long, env = "USERBOOK_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "USERBOOK_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List users with optional search and pagination.
    List {
        #[arg(long, allow_hyphen_values = true)]
        page: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        search: Option<String>,
    },
    /// Create a user.
    Create {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Partially update a user; omitted fields keep their value.
    Update {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a user.
    Delete { id: String },
}

/// Record fields, given as flags or as one JSON object.
#[derive(Debug, clap::Args)]
pub struct FieldArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub age: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub email: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub address: Option<String>,
    /// JSON object with `name`, `age`, `email`, `address` keys.
    #[arg(long, conflicts_with_all = ["name", "age", "email", "address"])]
    pub json: Option<String>,
}
