//! # Version Stamps and Filenames
//!
//! How a migration's version is written into its filename, and how a fresh
//! version is chosen when a migration is brought to the top.

use super::MigrationVersion;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Strategy for choosing a new version number
pub trait VersionStamper {
    /// A version strictly greater than `floor`.
    ///
    /// `floor` is the highest version currently known; it is 0 when there
    /// are no migrations at all. At `u64::MAX` no such version exists and
    /// `floor` itself comes back, which callers must refuse.
    fn next_version(&self, floor: MigrationVersion) -> MigrationVersion;
}

/// UTC `%Y%m%d%H%M%S` stamps, bumped past `floor` on collision
#[derive(Debug, Clone, Default)]
pub struct TimestampStamper {
    fixed: Option<DateTime<Utc>>,
}

impl TimestampStamper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamper that always reads the clock as `at`
    pub fn at(at: DateTime<Utc>) -> Self {
        Self { fixed: Some(at) }
    }

    fn stamp(&self) -> MigrationVersion {
        let now = self.fixed.unwrap_or_else(Utc::now);
        now.format("%Y%m%d%H%M%S")
            .to_string()
            .parse()
            .unwrap_or(0)
    }
}

impl VersionStamper for TimestampStamper {
    fn next_version(&self, floor: MigrationVersion) -> MigrationVersion {
        self.stamp().max(floor.saturating_add(1))
    }
}

/// Always `floor + 1`, for projects numbering migrations 1, 2, 3...
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStamper;

impl VersionStamper for SequentialStamper {
    fn next_version(&self, floor: MigrationVersion) -> MigrationVersion {
        floor.saturating_add(1)
    }
}

/// Split a migration basename into its version token and display name.
///
/// `20230101120000_create_users.sql` -> `(20230101120000, "create_users")`.
/// Returns `None` unless the basename starts with digits followed by `_`.
pub fn parse_filename(basename: &str) -> Option<(MigrationVersion, String)> {
    let (token, suffix) = basename.split_once('_')?;
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let version = token.parse::<MigrationVersion>().ok()?;

    let name = match suffix.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => suffix,
    };
    Some((version, name.to_string()))
}

/// Path the file at `path` moves to when renumbered to `version`.
///
/// Directory and everything after the first `_` of the basename are kept;
/// only the leading version token changes. A basename without `_` is all
/// token, so only its extension survives.
pub fn relocated_path(path: &Path, version: MigrationVersion) -> Option<PathBuf> {
    let basename = path.file_name()?.to_str()?;

    let renamed = match basename.split_once('_') {
        Some((_token, suffix)) => format!("{}_{}", version, suffix),
        None => match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", version, ext),
            None => version.to_string(),
        },
    };

    Some(path.with_file_name(renamed))
}
