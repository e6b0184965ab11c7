//! CLI error types
//!
//! Every failure that ends the process is a [`CliError`] carrying a stable
//! code. Action failures inside the console never become one; they are shown
//! to the operator and the session continues.

use std::fmt;

use crate::migrations::AdapterError;

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

/// Error category, decides the exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config file missing, unreadable or invalid
    ConfigError,
    /// Migrations could not be listed or loaded
    LoadFailed,
    /// Requested migration version does not exist
    MigrationNotFound,
    /// A non-interactive action failed
    ActionFailed,
    /// The terminal could not be driven
    PromptFailed,
}

impl CliErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::LoadFailed => "LOAD_FAILED",
            Self::MigrationNotFound => "MIGRATION_NOT_FOUND",
            Self::ActionFailed => "ACTION_FAILED",
            Self::PromptFailed => "PROMPT_FAILED",
        }
    }

    /// Process exit status for this category
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError => 2,
            _ => 1,
        }
    }
}

/// A fatal CLI error
#[derive(Debug, Clone)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, message)
    }

    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::LoadFailed, message)
    }

    pub fn migration_not_found(version: u64) -> Self {
        Self::new(
            CliErrorCode::MigrationNotFound,
            format!("No migration with version {}", version),
        )
    }

    pub fn action_failed(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ActionFailed, message)
    }

    pub fn prompt_failed(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::PromptFailed, message)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<AdapterError> for CliError {
    fn from(err: AdapterError) -> Self {
        let mut message = err.to_string();
        for cause in crate::migrations::errors::error_trace(&err) {
            message.push_str(": ");
            message.push_str(&cause);
        }
        Self::load_failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("bad field");
        assert_eq!(err.to_string(), "[CONFIG_ERROR] bad field");
        assert_eq!(err.code().exit_code(), 2);
    }

    #[test]
    fn test_adapter_error_becomes_load_failed() {
        let err: CliError = AdapterError::DirectoryNotFound(PathBuf::from("db/migrate")).into();
        assert_eq!(err.code(), &CliErrorCode::LoadFailed);
        assert!(err.message().contains("db/migrate"));
        assert_eq!(err.code().exit_code(), 1);
    }
}
