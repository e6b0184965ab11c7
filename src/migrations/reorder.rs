//! # Bring to Top
//!
//! Renumbers a migration so it sorts after every other one, moves its file
//! to match and brings the ledger in line with the new version.
//!
//! Ledger handling depends on the migration's status and on whether the
//! operator asked for a re-run:
//!
//! | status | re-run | ledger                                         |
//! |--------|--------|------------------------------------------------|
//! | down   | -      | untouched                                      |
//! | up     | yes    | `down(old)` before the move, `up(new)` after   |
//! | up     | no     | `rename_applied_version(old, new)`             |
//!
//! Nothing is mutated until the file has been located and the new version
//! chosen. Once something has changed, any later failure is reported as
//! [`ActionError::PartialReorderFailure`] and never retried.

use super::adapter::MigrationAdapter;
use super::errors::ActionError;
use super::generator::{relocated_path, VersionStamper};
use super::{build_catalog, Migration, MigrationStatus, MigrationVersion};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Move `migration` to a fresh version above all others.
///
/// `confirm_rerun` is asked only for applied migrations. Returns the new
/// version; the caller is responsible for reloading the catalog.
pub fn bring_to_top<A, S, F>(
    migration: &Migration,
    adapter: &mut A,
    stamper: &S,
    confirm_rerun: F,
) -> Result<MigrationVersion, ActionError>
where
    A: MigrationAdapter + ?Sized,
    S: VersionStamper + ?Sized,
    F: FnOnce() -> bool,
{
    let version = migration.version;

    let path = adapter
        .find_filename_for_migration(migration)
        .map_err(|e| ActionError::execution_failed(&e))?
        .ok_or(ActionError::FileNotFound(version))?;

    // The version set does not change when the migration goes down, so the
    // new version can be fixed before anything is touched.
    let floor = version_floor(&*adapter).map_err(|e| ActionError::execution_failed(&e))?;
    let new_version = stamper.next_version(floor);
    let new_path = relocated_path(&path, new_version).ok_or_else(|| {
        ActionError::ExecutionFailed(
            format!("Cannot derive a new filename from {:?}", path),
            Vec::new(),
        )
    })?;

    if new_version <= floor {
        return Err(ActionError::ExecutionFailed(
            format!("No version left above {}", floor),
            Vec::new(),
        ));
    }
    if new_path.exists() {
        return Err(ActionError::ExecutionFailed(
            format!("Cannot move {:?}: {:?} already exists", path, new_path),
            Vec::new(),
        ));
    }

    let initial = migration.status;
    let rerun = initial == MigrationStatus::Up && confirm_rerun();

    if rerun {
        adapter
            .down(migration)
            .map_err(|e| ActionError::execution_failed(&e))?;
    }

    if let Err(e) = move_file(&path, &new_path) {
        warn!(version, new_version, error = %e, "migration file rename failed");
        return Err(if rerun {
            ActionError::PartialReorderFailure {
                version,
                new_version,
                reason: format!(
                    "migration was taken down but {:?} could not be renamed: {}",
                    path, e
                ),
            }
        } else {
            ActionError::execution_failed(&e)
        });
    }

    let reconciled = match (initial, rerun) {
        (MigrationStatus::Down, _) => Ok(()),
        (MigrationStatus::Up, true) => adapter.up(&migration.renumbered(new_version)),
        (MigrationStatus::Up, false) => adapter.rename_applied_version(version, new_version),
    };

    if let Err(e) = reconciled {
        warn!(version, new_version, error = %e, "ledger reconciliation failed");
        return Err(ActionError::PartialReorderFailure {
            version,
            new_version,
            reason: format!("file moved to {:?} but the ledger was not updated: {}", new_path, e),
        });
    }

    info!(
        version,
        new_version,
        rerun,
        path = ?new_path,
        "brought migration to top"
    );
    Ok(new_version)
}

/// Highest version known to the adapter, applied or not. 0 when empty.
fn version_floor<A>(adapter: &A) -> Result<MigrationVersion, super::AdapterError>
where
    A: MigrationAdapter + ?Sized,
{
    let listed = build_catalog(adapter)?
        .first()
        .map(|m| m.version)
        .unwrap_or(0);
    let last = adapter.last_version()?.unwrap_or(0);
    Ok(listed.max(last))
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{:?} already exists", to),
        ));
    }
    fs::rename(from, to)
}
