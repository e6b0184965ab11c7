//! # Schema Dump
//!
//! After every successful change the console asks a [`SchemaDumper`] to
//! refresh the project's schema file. Dumping is best effort: failures are
//! logged by the caller and never undo or fail the action.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Schema dump failures
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to start schema dump `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Schema dump `{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("Failed to write schema to {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes the current database schema somewhere
pub trait SchemaDumper {
    fn dump(&self) -> Result<(), DumpError>;
}

/// Dumper used when no dump command is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSchemaDumper;

impl SchemaDumper for NoopSchemaDumper {
    fn dump(&self) -> Result<(), DumpError> {
        debug!("schema dump disabled");
        Ok(())
    }
}

/// Runs a shell command and stores its stdout as the schema file
#[derive(Debug, Clone)]
pub struct CommandSchemaDumper {
    command: String,
    output: PathBuf,
}

impl CommandSchemaDumper {
    pub fn new(command: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }
}

impl SchemaDumper for CommandSchemaDumper {
    fn dump(&self) -> Result<(), DumpError> {
        let result = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .map_err(|e| DumpError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        if !result.status.success() {
            return Err(DumpError::Failed {
                command: self.command.clone(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let write_err = |e| DumpError::Write {
            path: self.output.clone(),
            source: e,
        };
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(&self.output, &result.stdout).map_err(write_err)?;

        info!(path = ?self.output, bytes = result.stdout.len(), "schema dumped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_output_is_written() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("db").join("schema.sql");
        let dumper = CommandSchemaDumper::new("printf 'CREATE TABLE t;'", &output);

        dumper.dump().unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "CREATE TABLE t;");
    }

    #[test]
    fn test_failing_command_keeps_previous_schema() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("schema.sql");
        fs::write(&output, "old").unwrap();
        let dumper = CommandSchemaDumper::new("echo nope >&2; exit 2", &output);

        let err = dumper.dump().unwrap_err();
        assert!(err.to_string().contains("nope"));
        assert_eq!(fs::read_to_string(&output).unwrap(), "old");
    }

    #[test]
    fn test_noop_dumper() {
        NoopSchemaDumper.dump().unwrap();
    }
}
