//! # Applied Ledger
//!
//! Durable record of which migration versions are applied, kept as a JSON
//! object keyed by version. Every mutation is written through immediately
//! with a temp-file-then-rename so the file on disk is always one complete
//! ledger, old or new.

use super::errors::{LedgerError, LedgerResult};
use super::MigrationVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One applied migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Migration version number
    pub version: MigrationVersion,

    /// Migration name (from filename)
    pub name: String,

    /// Checksum of the file when it was applied
    #[serde(default)]
    pub checksum: String,

    /// When the migration was applied
    pub applied_at: DateTime<Utc>,

    /// User that applied it
    #[serde(default)]
    pub applied_by: Option<String>,
}

impl LedgerEntry {
    /// Entry stamped with the current time and OS user
    pub fn now(version: MigrationVersion, name: impl Into<String>, checksum: String) -> Self {
        Self {
            version,
            name: name.into(),
            checksum,
            applied_at: Utc::now(),
            applied_by: Some(whoami::username()),
        }
    }
}

/// Applied-versions ledger backed by a JSON file
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<MigrationVersion, LedgerEntry>,
}

impl Ledger {
    /// Open the ledger at `path`; a missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            Self::read(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    fn read(path: &Path) -> LedgerResult<BTreeMap<MigrationVersion, LedgerEntry>> {
        let content = fs::read_to_string(path).map_err(|e| LedgerError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| LedgerError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the ledger to disk.
    pub fn save(&self) -> LedgerResult<()> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            LedgerError::ParseError {
                path: self.path.clone(),
                message: format!("Failed to serialize ledger: {}", e),
            }
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| LedgerError::FileWrite {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, &content).map_err(|e| LedgerError::FileWrite {
            path: temp_file.clone(),
            source: e,
        })?;

        fs::rename(&temp_file, &self.path).map_err(|e| LedgerError::FileWrite {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Highest applied version
    pub fn last_version(&self) -> Option<MigrationVersion> {
        self.entries.keys().next_back().copied()
    }

    pub fn is_applied(&self, version: MigrationVersion) -> bool {
        self.entries.contains_key(&version)
    }

    pub fn get(&self, version: MigrationVersion) -> Option<&LedgerEntry> {
        self.entries.get(&version)
    }

    /// Applied versions in ascending order
    pub fn versions(&self) -> Vec<MigrationVersion> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a migration as applied.
    pub fn insert(&mut self, entry: LedgerEntry) -> LedgerResult<()> {
        let version = entry.version;
        if self.entries.contains_key(&version) {
            return Err(LedgerError::AlreadyApplied { version });
        }

        self.entries.insert(version, entry);
        if let Err(e) = self.save() {
            self.entries.remove(&version);
            return Err(e);
        }
        Ok(())
    }

    /// Forget an applied migration, returning its entry.
    pub fn remove(&mut self, version: MigrationVersion) -> LedgerResult<LedgerEntry> {
        let entry = self
            .entries
            .remove(&version)
            .ok_or(LedgerError::NotApplied { version })?;

        if let Err(e) = self.save() {
            self.entries.insert(version, entry);
            return Err(e);
        }
        Ok(entry)
    }

    /// Move the entry for `old` to `new` in a single write.
    ///
    /// The applied timestamp and checksum travel with the entry; the file is
    /// replaced atomically, so the old and new rows never coexist on disk.
    pub fn rename(&mut self, old: MigrationVersion, new: MigrationVersion) -> LedgerResult<()> {
        if self.entries.contains_key(&new) {
            return Err(LedgerError::AlreadyApplied { version: new });
        }
        let mut entry = self
            .entries
            .remove(&old)
            .ok_or(LedgerError::NotApplied { version: old })?;

        entry.version = new;
        self.entries.insert(new, entry);

        if let Err(e) = self.save() {
            if let Some(mut entry) = self.entries.remove(&new) {
                entry.version = old;
                self.entries.insert(old, entry);
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> Ledger {
        Ledger::open(dir.path().join("ledger.json")).unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = ledger_in(&temp_dir);
        assert!(ledger.is_empty());
        assert_eq!(ledger.last_version(), None);
    }

    #[test]
    fn test_insert_persists() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp_dir);

        ledger
            .insert(LedgerEntry::now(20230101, "create_users", String::new()))
            .unwrap();
        ledger
            .insert(LedgerEntry::now(20230102, "create_posts", String::new()))
            .unwrap();

        let reopened = ledger_in(&temp_dir);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.last_version(), Some(20230102));
        assert_eq!(reopened.get(20230101).unwrap().name, "create_users");
    }

    #[test]
    fn test_insert_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp_dir);

        ledger.insert(LedgerEntry::now(1, "a", String::new())).unwrap();
        let result = ledger.insert(LedgerEntry::now(1, "a", String::new()));
        assert!(matches!(
            result,
            Err(LedgerError::AlreadyApplied { version: 1 })
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_remove_missing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp_dir);
        assert!(matches!(
            ledger.remove(7),
            Err(LedgerError::NotApplied { version: 7 })
        ));
    }

    #[test]
    fn test_rename_moves_entry() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp_dir);
        ledger
            .insert(LedgerEntry::now(20230102, "b", "crc32:0000ABCD".to_string()))
            .unwrap();

        ledger.rename(20230102, 20240101).unwrap();

        let reopened = ledger_in(&temp_dir);
        assert_eq!(reopened.versions(), vec![20240101]);
        let entry = reopened.get(20240101).unwrap();
        assert_eq!(entry.version, 20240101);
        assert_eq!(entry.checksum, "crc32:0000ABCD");
    }

    #[test]
    fn test_rename_onto_applied_version_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp_dir);
        ledger.insert(LedgerEntry::now(1, "a", String::new())).unwrap();
        ledger.insert(LedgerEntry::now(2, "b", String::new())).unwrap();

        assert!(ledger.rename(1, 2).is_err());
        assert_eq!(ledger.versions(), vec![1, 2]);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        let result = Ledger::open(&path);
        assert!(matches!(result, Err(LedgerError::ParseError { .. })));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db").join("migrate").join(".ledger.json");
        let mut ledger = Ledger::open(&path).unwrap();

        ledger.insert(LedgerEntry::now(3, "c", String::new())).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
