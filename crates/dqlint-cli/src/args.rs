//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "dqlint")]
#[command(author, version, about = "DQL query validation and completion tool")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to dqlint.toml in this or a parent directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check query files, or queries embedded in source files
    Check {
        /// Files to check (supports glob patterns)
        files: Vec<PathBuf>,

        /// Schema version to validate against (v19, v20, v21)
        #[arg(short = 's', long = "schema-version", value_name = "VERSION", env = "DQLINT_SCHEMA_VERSION")]
        schema_version: Option<String>,

        /// Directory containing <version>.json schema artifacts
        #[arg(long = "schema-dir", value_name = "DIR")]
        schema_dir: Option<PathBuf>,

        /// Error codes or names to suppress (e.g. Q0005, invalid-field)
        #[arg(long, value_name = "CODE")]
        disable: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Maximum number of errors before stopping (0 for no limit)
        #[arg(long, default_value = "100")]
        max_errors: usize,
    },

    /// Display schema information
    Schema {
        /// Resource whose fields should be listed
        resource: Option<String>,

        /// Schema version to display
        #[arg(short = 's', long = "schema-version", value_name = "VERSION", env = "DQLINT_SCHEMA_VERSION")]
        schema_version: Option<String>,

        /// Directory containing <version>.json schema artifacts
        #[arg(long = "schema-dir", value_name = "DIR")]
        schema_dir: Option<PathBuf>,
    },

    /// Show completions at a byte offset (for debugging editor integrations)
    Complete {
        /// File containing the query text
        file: PathBuf,

        /// Cursor position as a byte offset into the file
        #[arg(long)]
        offset: usize,

        /// Schema version to complete against
        #[arg(short = 's', long = "schema-version", value_name = "VERSION", env = "DQLINT_SCHEMA_VERSION")]
        schema_version: Option<String>,

        /// Directory containing <version>.json schema artifacts
        #[arg(long = "schema-dir", value_name = "DIR")]
        schema_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// SARIF output (for GitHub Code Scanning)
    Sarif,
}
