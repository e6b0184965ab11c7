//! # Migration Errors
//!
//! Three layers, innermost first:
//!
//! - [`LedgerError`]: persistence of the applied-versions ledger
//! - [`AdapterError`]: anything the migration adapter can fail with
//! - [`ActionError`]: what the operator sees after choosing an action

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::MigrationVersion;

/// Frames of an error's source chain kept for display
pub const MAX_TRACE_FRAMES: usize = 5;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Ledger persistence errors
#[derive(Debug)]
pub enum LedgerError {
    /// Ledger file could not be read
    FileRead { path: PathBuf, source: io::Error },

    /// Ledger file could not be written
    FileWrite { path: PathBuf, source: io::Error },

    /// Ledger file is not valid JSON
    ParseError { path: PathBuf, message: String },

    /// Version already has a ledger entry
    AlreadyApplied { version: MigrationVersion },

    /// Version has no ledger entry
    NotApplied { version: MigrationVersion },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileRead { path, .. } => {
                write!(f, "Failed to read ledger file {:?}", path)
            }
            Self::FileWrite { path, .. } => {
                write!(f, "Failed to write ledger file {:?}", path)
            }
            Self::ParseError { path, message } => {
                write!(f, "Failed to parse ledger {:?}: {}", path, message)
            }
            Self::AlreadyApplied { version } => {
                write!(f, "Migration {} is already recorded as applied", version)
            }
            Self::NotApplied { version } => {
                write!(f, "Migration {} is not recorded as applied", version)
            }
        }
    }
}

impl StdError for LedgerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::FileRead { source, .. } | Self::FileWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised by a [`MigrationAdapter`](super::MigrationAdapter)
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Migrations directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Migration version {version} is defined twice: {first:?} and {second:?}")]
    DuplicateVersion {
        version: MigrationVersion,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("No migration file for version {0}")]
    MissingFile(MigrationVersion),

    #[error("Migration {0} is already up")]
    AlreadyUp(MigrationVersion),

    #[error("Migration {0} is not up")]
    NotUp(MigrationVersion),

    #[error("Hook `{command}` exited with {}: {stderr}", exit_code_label(.code))]
    HookFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to start hook `{command}`")]
    HookSpawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failure of an operator-chosen action
///
/// None of these end the session; the console shows them and reloads.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Migration {0} has no file; it can be viewed but not changed")]
    NoFileForMigration(MigrationVersion),

    #[error("Could not locate the file for migration {0}")]
    FileNotFound(MigrationVersion),

    #[error("{0}")]
    ExecutionFailed(String, Vec<String>),

    #[error(
        "Moving migration {version} to {new_version} stopped half way: {reason}. \
         Check the ledger and the migrations directory before retrying."
    )]
    PartialReorderFailure {
        version: MigrationVersion,
        new_version: MigrationVersion,
        reason: String,
    },
}

impl ActionError {
    /// Wrap any fault raised below the executor boundary.
    pub fn execution_failed(err: &(dyn StdError + 'static)) -> Self {
        Self::ExecutionFailed(err.to_string(), error_trace(err))
    }

    /// Source chain kept for display, empty for everything but
    /// `ExecutionFailed`.
    pub fn trace(&self) -> &[String] {
        match self {
            Self::ExecutionFailed(_, trace) => trace,
            _ => &[],
        }
    }
}

/// Messages of `err`'s source chain below the top-level message, at most
/// [`MAX_TRACE_FRAMES`] of them.
pub fn error_trace(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut frames = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        if frames.len() == MAX_TRACE_FRAMES {
            break;
        }
        frames.push(cause.to_string());
        current = cause.source();
    }
    frames
}
