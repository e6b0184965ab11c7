//! # Filesystem Migration Runner
//!
//! The adapter shipped with the console: migration files live in one
//! directory as `<version>_<suffix>`, the applied set lives in a JSON
//! [`Ledger`], and the actual up/down work is delegated to operator
//! configured [`Hook`]s. Without hooks the runner only keeps bookkeeping.

use super::adapter::{MigrationAdapter, MigrationTuple};
use super::checksum::{checksum_file, matches_recorded};
use super::errors::{AdapterError, AdapterResult};
use super::generator::parse_filename;
use super::hooks::Hook;
use super::state::{Ledger, LedgerEntry};
use super::{Migration, MigrationStatus, MigrationVersion, NO_FILE_SENTINEL};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A migration file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: MigrationVersion,
    /// Version exactly as written in the filename
    pub token: String,
    pub name: String,
    pub path: PathBuf,
}

/// Directory-and-ledger migration adapter
#[derive(Debug)]
pub struct MigrationRunner {
    /// Directory containing migration files
    migrations_dir: PathBuf,

    /// Applied versions
    ledger: Ledger,

    up_hook: Option<Hook>,
    down_hook: Option<Hook>,

    /// Set once the "bookkeeping only" warning has been logged
    warned_without_hook: bool,
}

impl MigrationRunner {
    pub fn new(migrations_dir: impl Into<PathBuf>, ledger: Ledger) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            ledger,
            up_hook: None,
            down_hook: None,
            warned_without_hook: false,
        }
    }

    /// Open the ledger at `ledger_path` and attach it to `migrations_dir`.
    pub fn open(
        migrations_dir: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
    ) -> AdapterResult<Self> {
        let ledger = Ledger::open(ledger_path)?;
        Ok(Self::new(migrations_dir, ledger))
    }

    pub fn with_hooks(mut self, up: Option<Hook>, down: Option<Hook>) -> Self {
        self.up_hook = up;
        self.down_hook = down;
        self
    }

    pub fn migrations_dir(&self) -> &PathBuf {
        &self.migrations_dir
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Scan the migrations directory.
    pub fn load_files(&self) -> AdapterResult<BTreeMap<MigrationVersion, MigrationFile>> {
        if !self.migrations_dir.is_dir() {
            return Err(AdapterError::DirectoryNotFound(self.migrations_dir.clone()));
        }

        let io_err = |e| AdapterError::Io {
            path: self.migrations_dir.clone(),
            source: e,
        };

        let mut files: BTreeMap<MigrationVersion, MigrationFile> = BTreeMap::new();
        for entry in fs::read_dir(&self.migrations_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }

            let path = entry.path();
            let Some(basename) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((version, name)) = parse_filename(basename) else {
                debug!(?path, "skipping non-migration file");
                continue;
            };
            let token = basename.split('_').next().unwrap_or_default().to_string();

            if let Some(existing) = files.get(&version) {
                return Err(AdapterError::DuplicateVersion {
                    version,
                    first: existing.path.clone(),
                    second: path,
                });
            }
            files.insert(
                version,
                MigrationFile {
                    version,
                    token,
                    name,
                    path,
                },
            );
        }

        debug!(count = files.len(), dir = ?self.migrations_dir, "loaded migration files");
        Ok(files)
    }

    fn file_for(&self, version: MigrationVersion) -> AdapterResult<MigrationFile> {
        self.load_files()?
            .remove(&version)
            .ok_or(AdapterError::MissingFile(version))
    }

    fn warn_without_hook(&mut self) {
        if !self.warned_without_hook {
            warn!("no up/down command configured; only the ledger will be updated");
            self.warned_without_hook = true;
        }
    }

    fn apply(&mut self, file: &MigrationFile) -> AdapterResult<()> {
        if self.ledger.is_applied(file.version) {
            return Err(AdapterError::AlreadyUp(file.version));
        }

        match self.up_hook.clone() {
            Some(hook) => hook.run(&file.path, file.version, &file.name)?,
            None => self.warn_without_hook(),
        }

        let checksum = checksum_file(&file.path).map_err(|e| AdapterError::Io {
            path: file.path.clone(),
            source: e,
        })?;
        self.ledger
            .insert(LedgerEntry::now(file.version, file.name.clone(), checksum))?;

        info!(version = file.version, name = %file.name, "migrated up");
        Ok(())
    }

    fn revert(&mut self, version: MigrationVersion) -> AdapterResult<()> {
        let recorded = match self.ledger.get(version) {
            Some(entry) => entry.checksum.clone(),
            None => return Err(AdapterError::NotUp(version)),
        };
        let file = self.file_for(version)?;

        match matches_recorded(&file.path, &recorded) {
            Ok(true) => {}
            Ok(false) => warn!(
                version,
                path = ?file.path,
                "migration file changed since it was applied"
            ),
            Err(e) => warn!(version, error = %e, "could not checksum migration file"),
        }

        match self.down_hook.clone() {
            Some(hook) => hook.run(&file.path, file.version, &file.name)?,
            None => self.warn_without_hook(),
        }

        self.ledger.remove(version)?;

        info!(version, name = %file.name, "migrated down");
        Ok(())
    }
}

impl MigrationAdapter for MigrationRunner {
    fn last_version(&self) -> AdapterResult<Option<MigrationVersion>> {
        Ok(self.ledger.last_version())
    }

    fn list_migration_tuples(&self) -> AdapterResult<Vec<MigrationTuple>> {
        let files = self.load_files()?;

        let versions: BTreeSet<MigrationVersion> = files
            .keys()
            .copied()
            .chain(self.ledger.versions())
            .collect();

        Ok(versions
            .into_iter()
            .map(|version| {
                let status = if self.ledger.is_applied(version) {
                    MigrationStatus::Up
                } else {
                    MigrationStatus::Down
                };
                match files.get(&version) {
                    Some(file) => MigrationTuple::new(status.as_str(), &file.token, &file.name),
                    None => MigrationTuple::new(
                        status.as_str(),
                        version.to_string(),
                        NO_FILE_SENTINEL,
                    ),
                }
            })
            .collect())
    }

    fn find_filename_for_migration(&self, migration: &Migration) -> AdapterResult<Option<PathBuf>> {
        Ok(self
            .load_files()?
            .remove(&migration.version)
            .map(|file| file.path))
    }

    fn up(&mut self, migration: &Migration) -> AdapterResult<()> {
        let file = self.file_for(migration.version)?;
        self.apply(&file)
    }

    fn down(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.revert(migration.version)
    }

    fn redo(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.revert(migration.version)?;
        let file = self.file_for(migration.version)?;
        self.apply(&file)
    }

    fn migrate(&mut self, migration: &Migration) -> AdapterResult<()> {
        let target = migration.version;

        let newer: Vec<MigrationVersion> = self
            .ledger
            .versions()
            .into_iter()
            .rev()
            .filter(|v| *v > target)
            .collect();
        for version in newer {
            self.revert(version)?;
        }

        let pending: Vec<MigrationFile> = self
            .load_files()?
            .into_values()
            .filter(|f| f.version <= target && !self.ledger.is_applied(f.version))
            .collect();
        for file in &pending {
            self.apply(file)?;
        }

        info!(target, "migrated to version");
        Ok(())
    }

    fn rollback(&mut self, migration: &Migration) -> AdapterResult<()> {
        let versions: Vec<MigrationVersion> = self
            .ledger
            .versions()
            .into_iter()
            .rev()
            .filter(|v| *v >= migration.version)
            .collect();
        for version in versions {
            self.revert(version)?;
        }
        Ok(())
    }

    fn rename_applied_version(
        &mut self,
        old: MigrationVersion,
        new: MigrationVersion,
    ) -> AdapterResult<()> {
        self.ledger.rename(old, new)?;
        info!(old, new, "renumbered applied migration");
        Ok(())
    }
}
