// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;
pub mod config_loader;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Schemaport - Database schema export/import CLI
///
/// Reads table structures from a live database, orders them by foreign key
/// dependency, and writes a CREATE TABLE script that recreates them.
#[derive(Parser, Debug)]
#[command(name = "schemaport")]
#[command(author = "Schemaport Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Database schema export/import tool")]
#[command(long_about = "Schemaport - Database schema export/import tool

Reads table, column, primary key and foreign key metadata from a live
database and writes it out as an ordered CREATE TABLE script, or replays
such a script against another database.

Supported connections: SQLite, MySQL, PostgreSQL, SQL Server
Supported export targets: the above plus legacy Jet (Access)")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Describe your databases in .schemaport.yaml
  2. Inspect a database:      schemaport inspect --env development
  3. Export its schema:       schemaport export --env development --output schema.sql
  4. Recreate it elsewhere:   schemaport import --env staging --input schema.sql

For detailed help on each command, use: schemaport <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a database schema to a SQL script
    ///
    /// Tables are written in foreign key dependency order so the script
    /// can be replayed top to bottom against an empty database.
    ///
    /// EXAMPLES:
    ///   # Export using the source database's own dialect
    ///   schemaport export --env development --output schema.sql
    ///
    ///   # Export as a legacy Jet (Access) script
    ///   schemaport export --env development --output schema.sql --target jet
    Export {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,

        /// Output file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Dialect of the generated script (defaults to the source dialect)
        #[arg(short, long, value_name = "DIALECT")]
        target: Option<String>,
    },

    /// Import a SQL script into a database
    ///
    /// Statements run one at a time. The first failing statement stops the
    /// import; statements that already ran are not rolled back.
    ///
    /// EXAMPLES:
    ///   # Replay an exported script
    ///   schemaport import --env staging --input schema.sql
    ///
    ///   # Legacy scripts separated by blank lines
    ///   schemaport import --env staging --input legacy.sql --blank-line-delimited
    Import {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,

        /// Input file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Split statements on blank lines instead of semicolons
        #[arg(long)]
        blank_line_delimited: bool,
    },

    /// Show the tables of a database in dependency order
    ///
    /// EXAMPLES:
    ///   schemaport inspect --env development
    ///   schemaport inspect --env development --format json
    Inspect {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,

        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
