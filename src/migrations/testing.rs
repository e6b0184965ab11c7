//! Recording adapter used by the unit tests.

use super::adapter::{MigrationAdapter, MigrationTuple};
use super::errors::{AdapterError, AdapterResult};
use super::generator::parse_filename;
use super::{Migration, MigrationStatus, MigrationVersion, NO_FILE_SENTINEL};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A mutating adapter call, in the order it was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdapterCall {
    Up(MigrationVersion),
    Down(MigrationVersion),
    Redo(MigrationVersion),
    Migrate(MigrationVersion),
    Rollback(MigrationVersion),
    RenameApplied(MigrationVersion, MigrationVersion),
}

/// Operation the fake should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Up,
    Down,
    Redo,
    Rename,
}

/// In-memory ledger plus either an in-memory or an on-disk file set.
///
/// With a directory, files are real and are rediscovered on every call, so
/// renames done by the code under test are visible to later calls.
#[derive(Debug, Default)]
pub(crate) struct FakeAdapter {
    dir: Option<PathBuf>,
    files: BTreeMap<MigrationVersion, String>,
    tuples: Option<Vec<MigrationTuple>>,
    ledger: Vec<MigrationVersion>,
    calls: Vec<AdapterCall>,
    fail: Option<Op>,
    fail_listing: bool,
    hide_files: bool,
    create_on_down: Option<PathBuf>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep migration files in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, version: MigrationVersion, name: &str) -> Self {
        match &self.dir {
            Some(dir) => {
                fs::write(dir.join(format!("{}_{}.sql", version, name)), name).unwrap();
            }
            None => {
                self.files.insert(version, name.to_string());
            }
        }
        self
    }

    pub fn with_applied_file(self, version: MigrationVersion, name: &str) -> Self {
        let mut adapter = self.with_file(version, name);
        adapter.ledger.push(version);
        adapter
    }

    /// Ledger row with no file behind it
    pub fn with_orphan_row(mut self, version: MigrationVersion) -> Self {
        self.ledger.push(version);
        self
    }

    /// Report these tuples verbatim instead of deriving them
    pub fn with_tuples(mut self, tuples: Vec<MigrationTuple>) -> Self {
        self.tuples = Some(tuples);
        self
    }

    pub fn failing(mut self, op: Op) -> Self {
        self.fail = Some(op);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// `find_filename_for_migration` always answers `None`
    pub fn hiding_files(mut self) -> Self {
        self.hide_files = true;
        self
    }

    /// Create a directory at `path` whenever `down` succeeds, standing in
    /// for another process grabbing a filename mid-operation.
    pub fn occupying_on_down(mut self, path: PathBuf) -> Self {
        self.create_on_down = Some(path);
        self
    }

    pub fn calls(&self) -> &[AdapterCall] {
        &self.calls
    }

    pub fn ledger(&self) -> &[MigrationVersion] {
        &self.ledger
    }

    pub fn ledger_count(&self, version: MigrationVersion) -> usize {
        self.ledger.iter().filter(|v| **v == version).count()
    }

    /// Catalog row for `version` as the console would build it
    pub fn migration(&self, version: MigrationVersion) -> Migration {
        super::build_catalog(self)
            .unwrap()
            .into_iter()
            .find(|m| m.version == version)
            .unwrap()
    }

    fn file_map(&self) -> BTreeMap<MigrationVersion, (String, Option<PathBuf>)> {
        match &self.dir {
            Some(dir) => fs::read_dir(dir)
                .unwrap()
                .filter_map(|entry| {
                    let path = entry.unwrap().path();
                    if !path.is_file() {
                        return None;
                    }
                    let basename = path.file_name()?.to_str()?.to_string();
                    let (version, name) = parse_filename(&basename)?;
                    Some((version, (name, Some(path))))
                })
                .collect(),
            None => self
                .files
                .iter()
                .map(|(v, name)| (*v, (name.clone(), None)))
                .collect(),
        }
    }

    fn injected(&self, op: Op) -> AdapterResult<()> {
        if self.fail == Some(op) {
            return Err(AdapterError::HookFailed {
                command: format!("{:?}", op).to_lowercase(),
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MigrationAdapter for FakeAdapter {
    fn last_version(&self) -> AdapterResult<Option<MigrationVersion>> {
        Ok(self.ledger.iter().copied().max())
    }

    fn list_migration_tuples(&self) -> AdapterResult<Vec<MigrationTuple>> {
        if self.fail_listing {
            return Err(AdapterError::DirectoryNotFound(PathBuf::from("fake")));
        }
        if let Some(tuples) = &self.tuples {
            return Ok(tuples.clone());
        }

        let files = self.file_map();
        let mut versions: Vec<MigrationVersion> =
            files.keys().copied().chain(self.ledger.iter().copied()).collect();
        versions.sort_unstable();
        versions.dedup();

        Ok(versions
            .into_iter()
            .map(|version| {
                let status = if self.ledger.contains(&version) {
                    MigrationStatus::Up
                } else {
                    MigrationStatus::Down
                };
                let name = files
                    .get(&version)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| NO_FILE_SENTINEL.to_string());
                MigrationTuple::new(status.as_str(), version.to_string(), name)
            })
            .collect())
    }

    fn find_filename_for_migration(&self, migration: &Migration) -> AdapterResult<Option<PathBuf>> {
        if self.hide_files {
            return Ok(None);
        }
        Ok(self
            .file_map()
            .remove(&migration.version)
            .and_then(|(_, path)| path))
    }

    fn up(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.calls.push(AdapterCall::Up(migration.version));
        self.injected(Op::Up)?;
        if !self.file_map().contains_key(&migration.version) {
            return Err(AdapterError::MissingFile(migration.version));
        }
        if self.ledger.contains(&migration.version) {
            return Err(AdapterError::AlreadyUp(migration.version));
        }
        self.ledger.push(migration.version);
        Ok(())
    }

    fn down(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.calls.push(AdapterCall::Down(migration.version));
        self.injected(Op::Down)?;
        let before = self.ledger.len();
        self.ledger.retain(|v| *v != migration.version);
        if self.ledger.len() == before {
            return Err(AdapterError::NotUp(migration.version));
        }
        if let Some(path) = &self.create_on_down {
            fs::create_dir_all(path).unwrap();
        }
        Ok(())
    }

    fn redo(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.calls.push(AdapterCall::Redo(migration.version));
        self.injected(Op::Redo)
    }

    fn migrate(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.calls.push(AdapterCall::Migrate(migration.version));
        Ok(())
    }

    fn rollback(&mut self, migration: &Migration) -> AdapterResult<()> {
        self.calls.push(AdapterCall::Rollback(migration.version));
        Ok(())
    }

    fn rename_applied_version(
        &mut self,
        old: MigrationVersion,
        new: MigrationVersion,
    ) -> AdapterResult<()> {
        self.calls.push(AdapterCall::RenameApplied(old, new));
        self.injected(Op::Rename)?;
        for version in self.ledger.iter_mut().filter(|v| **v == old) {
            *version = new;
        }
        Ok(())
    }
}
