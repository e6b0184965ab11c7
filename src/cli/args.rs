//! CLI argument definitions using clap
//!
//! Commands:
//! - migconsole [console]
//! - migconsole status
//! - migconsole bring-to-top <VERSION> [--rerun]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and reorder database migrations interactively
#[derive(Parser, Debug)]
#[command(name = "migconsole")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ./migconsole.json if present)
    #[arg(long, global = true, env = "MIGCONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the migration files
    #[arg(long, global = true, env = "MIGCONSOLE_MIGRATIONS_DIR")]
    pub migrations_dir: Option<PathBuf>,

    /// Path to the applied-versions ledger
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive console (default)
    Console,

    /// Print every migration and its status as JSON
    Status,

    /// Renumber a migration so it runs after all others
    BringToTop {
        /// Current version of the migration
        version: u64,

        /// For an applied migration: run it down, move it, run it up again
        #[arg(long)]
        rerun: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Subcommand to run, `console` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Console)
    }
}
