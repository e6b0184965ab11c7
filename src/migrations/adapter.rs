//! # Migration Adapter
//!
//! The capability boundary the console depends on. An adapter owns the
//! migration files and the applied ledger; the catalog, policy, executor and
//! reorder engine only ever touch them through this trait.

use std::path::PathBuf;

use super::errors::AdapterResult;
use super::{Migration, MigrationVersion};

/// One listing row as the adapter reports it, before any parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTuple {
    /// `"up"` or `"down"`
    pub status: String,

    /// Version token, normally all digits
    pub version: String,

    /// Display name, or [`NO_FILE_SENTINEL`](super::NO_FILE_SENTINEL) for
    /// ledger rows without a file
    pub name: String,
}

impl MigrationTuple {
    pub fn new(
        status: impl Into<String>,
        version: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            status: status.into(),
            version: version.into(),
            name: name.into(),
        }
    }
}

/// Capabilities the console needs from a migration framework
///
/// Every mutating operation may fail; callers above the executor never see
/// those failures directly.
pub trait MigrationAdapter {
    /// Most recently applied version, `None` when nothing is applied
    fn last_version(&self) -> AdapterResult<Option<MigrationVersion>>;

    /// Every known migration, files and ledger rows alike
    fn list_migration_tuples(&self) -> AdapterResult<Vec<MigrationTuple>>;

    /// Source file for a migration, `None` if no file carries its version
    fn find_filename_for_migration(&self, migration: &Migration) -> AdapterResult<Option<PathBuf>>;

    /// Apply one migration
    fn up(&mut self, migration: &Migration) -> AdapterResult<()>;

    /// Revert one migration
    fn down(&mut self, migration: &Migration) -> AdapterResult<()>;

    /// Revert then re-apply one migration
    fn redo(&mut self, migration: &Migration) -> AdapterResult<()>;

    /// Move the database to this migration's version
    fn migrate(&mut self, migration: &Migration) -> AdapterResult<()>;

    /// Revert this migration and everything applied after it
    fn rollback(&mut self, migration: &Migration) -> AdapterResult<()>;

    /// Move an applied ledger row from `old` to `new` as one change
    ///
    /// Used when an applied migration is renumbered without being re-run.
    /// Implementations must never leave both rows or neither behind.
    fn rename_applied_version(
        &mut self,
        old: MigrationVersion,
        new: MigrationVersion,
    ) -> AdapterResult<()>;
}
