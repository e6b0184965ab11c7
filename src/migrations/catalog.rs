//! # Migration Catalog
//!
//! Builds the operator's view of every migration from the adapter listing.

use super::adapter::MigrationAdapter;
use super::errors::AdapterResult;
use super::{parse_version, Migration, MigrationStatus, NO_FILE_SENTINEL};

/// Every migration the adapter knows about, newest version first.
///
/// Version tokens that are not numeric become 0. Adapter failures are
/// returned as-is.
pub fn build_catalog<A>(adapter: &A) -> AdapterResult<Vec<Migration>>
where
    A: MigrationAdapter + ?Sized,
{
    let last = adapter.last_version()?;

    let mut catalog: Vec<Migration> = adapter
        .list_migration_tuples()?
        .into_iter()
        .map(|tuple| {
            let version = parse_version(&tuple.version);
            Migration {
                version,
                status: MigrationStatus::from_tuple(&tuple.status),
                has_file: tuple.name != NO_FILE_SENTINEL,
                current: last == Some(version),
                name: tuple.name,
            }
        })
        .collect();

    // Stable, so 0-version ties keep the adapter's order.
    catalog.sort_by(|a, b| b.version.cmp(&a.version));
    Ok(catalog)
}
