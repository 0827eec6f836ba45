//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Inspect SQLite tables through record types.
#[derive(Parser, Debug)]
#[command(name = "recordmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(short, long, global = true, env = "RECORDMAP_DB")]
    pub db: Option<String>,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, global = true, env = "RECORDMAP_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "RECORDMAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print core ping and version
    Ping,

    /// List the columns of a table
    Columns(TableArgs),

    /// Count rows, optionally filtered by a WHERE fragment
    Count(CountArgs),

    /// Print the row with the given primary key
    Get(GetArgs),

    /// Print rows whose field matches one or more values
    FindBy(FindByArgs),
}

/// Table selection shared by all table commands
#[derive(Parser, Debug)]
pub struct TableArgs {
    /// Table name
    pub table: String,

    /// Primary key column
    #[arg(long, default_value = "id")]
    pub primary_key: String,
}

/// Arguments for the count command
#[derive(Parser, Debug)]
pub struct CountArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Trusted WHERE fragment using `?` placeholders
    #[arg(short = 'w', long = "where")]
    pub where_fragment: Option<String>,

    /// Values bound to the fragment's placeholders, in order
    pub params: Vec<String>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Primary key value
    pub id: String,
}

/// Arguments for the find-by command
#[derive(Parser, Debug)]
pub struct FindByArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Column to match
    pub field: String,

    /// One value matches by equality, several by IN-list
    #[arg(required = true)]
    pub values: Vec<String>,
}
