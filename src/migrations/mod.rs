//! # Migration Bookkeeping
//!
//! Reconciles on-disk migration files with the applied-versions ledger and
//! performs the operations an operator can run against a single migration.
//!
//! The pieces, leaves first:
//!
//! 1. **Adapter** (`adapter`): capability boundary that lists migrations,
//!    reports the last applied version and runs up/down/redo/migrate/rollback
//! 2. **Catalog** (`catalog`): turns adapter tuples into typed [`Migration`]
//!    records, newest first
//! 3. **Policy** (`policy`): which actions are legal for a status
//! 4. **Executor** (`executor`): dispatches an action, the single fault
//!    boundary of the console
//! 5. **Reorder** (`reorder`): bring-to-top, renumbers a migration and keeps
//!    the ledger consistent with the rename
//!
//! `runner` and `state` provide the filesystem adapter and its JSON ledger.
//!
//! # Migration File Format
//!
//! Files are named `<version>_<descriptive_suffix>`:
//!
//! ```text
//! db/migrate/20230101120000_create_users.sql
//! db/migrate/20230102093000_add_email_index.sql
//! ```
//!
//! The body is never parsed here.

pub mod adapter;
pub mod catalog;
pub mod checksum;
pub mod errors;
pub mod executor;
pub mod generator;
pub mod hooks;
pub mod policy;
pub mod reorder;
pub mod runner;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{MigrationAdapter, MigrationTuple};
pub use catalog::build_catalog;
pub use errors::{ActionError, AdapterError, AdapterResult};
pub use executor::{ensure_actionable, ActionExecutor, ActionOutcome};
pub use generator::{SequentialStamper, TimestampStamper, VersionStamper};
pub use policy::{legal_actions, menu_actions, ActionKind};
pub use runner::MigrationRunner;
pub use state::{Ledger, LedgerEntry};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Migration version number (usually a `%Y%m%d%H%M%S` stamp)
pub type MigrationVersion = u64;

/// Display name reported for ledger rows that have no migration file
pub const NO_FILE_SENTINEL: &str = "********** NO FILE **********";

/// Whether a version is present in the applied ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Up,
    Down,
}

impl MigrationStatus {
    /// Parse the status column of a migration tuple. Only `"up"` is applied.
    pub fn from_tuple(status: &str) -> Self {
        if status.trim().eq_ignore_ascii_case("up") {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the catalog
///
/// Rebuilt from the adapter on every session iteration; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Numeric version, the only identity that survives a rename
    pub version: MigrationVersion,

    /// Display label taken from the file basename
    pub name: String,

    /// Applied or pending
    pub status: MigrationStatus,

    /// False for orphan ledger rows
    pub has_file: bool,

    /// True for the most recently applied version
    pub current: bool,
}

impl Migration {
    /// Same migration under a different version, as it looks right after a
    /// renumbering and before it is applied again.
    pub fn renumbered(&self, version: MigrationVersion) -> Self {
        Self {
            version,
            name: self.name.clone(),
            status: MigrationStatus::Down,
            has_file: self.has_file,
            current: false,
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.current { "*" } else { " " };
        write!(
            f,
            "{} [{:>4}] {} {}",
            marker, self.status, self.version, self.name
        )
    }
}

/// Parse a version token. Non-numeric and empty tokens map to 0.
pub fn parse_version(token: &str) -> MigrationVersion {
    token.trim().parse::<MigrationVersion>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_numeric() {
        assert_eq!(parse_version("20230101120000"), 20230101120000);
        assert_eq!(parse_version(" 42 "), 42);
    }

    #[test]
    fn test_parse_version_non_numeric_is_zero() {
        assert_eq!(parse_version(""), 0);
        assert_eq!(parse_version("abc"), 0);
        assert_eq!(parse_version("12a"), 0);
        assert_eq!(parse_version("-5"), 0);
    }

    #[test]
    fn test_status_from_tuple() {
        assert_eq!(MigrationStatus::from_tuple("up"), MigrationStatus::Up);
        assert_eq!(MigrationStatus::from_tuple("UP"), MigrationStatus::Up);
        assert_eq!(MigrationStatus::from_tuple("down"), MigrationStatus::Down);
        assert_eq!(MigrationStatus::from_tuple(""), MigrationStatus::Down);
    }

    #[test]
    fn test_renumbered_is_pending() {
        let migration = Migration {
            version: 1,
            name: "create_users".to_string(),
            status: MigrationStatus::Up,
            has_file: true,
            current: true,
        };

        let moved = migration.renumbered(5);
        assert_eq!(moved.version, 5);
        assert_eq!(moved.name, "create_users");
        assert_eq!(moved.status, MigrationStatus::Down);
        assert!(!moved.current);
    }

    #[test]
    fn test_display_marks_current() {
        let migration = Migration {
            version: 7,
            name: "seed".to_string(),
            status: MigrationStatus::Up,
            has_file: true,
            current: true,
        };
        let line = migration.to_string();
        assert!(line.starts_with('*'));
        assert!(line.contains("up"));
        assert!(line.contains("7 seed"));
    }
}
