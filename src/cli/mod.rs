//! Command line surface: argument parsing, configuration, the interactive
//! session and its terminal prompts.

pub mod args;
pub mod commands;
pub mod errors;
pub mod prompt;
pub mod session;

pub use args::{Cli, Command};
pub use commands::{run, run_command, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use session::{Flow, PromptError, Prompter, Session};
