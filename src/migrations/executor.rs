//! # Action Executor
//!
//! Runs the action an operator picked for a migration. This is the only
//! place adapter faults are caught: everything raised below it comes back
//! as an [`ActionError`] for display and the session carries on.

use super::adapter::MigrationAdapter;
use super::errors::ActionError;
use super::generator::VersionStamper;
use super::policy::ActionKind;
use super::reorder::bring_to_top;
use super::{Migration, MigrationVersion};
use crate::schema_dump::SchemaDumper;
use tracing::{info, warn};

/// What a successful [`ActionExecutor::execute`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The adapter ran the action
    Completed,
    /// Nothing was touched
    Cancelled,
    /// Bring-to-top moved the migration to a new version
    Moved {
        from: MigrationVersion,
        to: MigrationVersion,
    },
}

/// Refuse migrations that only exist as a ledger row.
///
/// The console checks this once before showing the action menu.
pub fn ensure_actionable(migration: &Migration) -> Result<(), ActionError> {
    if migration.has_file {
        Ok(())
    } else {
        Err(ActionError::NoFileForMigration(migration.version))
    }
}

/// Dispatches actions to the adapter or the reorder engine
pub struct ActionExecutor<'a> {
    adapter: &'a mut dyn MigrationAdapter,
    stamper: &'a dyn VersionStamper,
    dumper: &'a dyn SchemaDumper,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(
        adapter: &'a mut dyn MigrationAdapter,
        stamper: &'a dyn VersionStamper,
        dumper: &'a dyn SchemaDumper,
    ) -> Self {
        Self {
            adapter,
            stamper,
            dumper,
        }
    }

    /// Read access for catalog rebuilds between actions
    pub fn adapter(&self) -> &dyn MigrationAdapter {
        &*self.adapter
    }

    /// Run `action` on `migration`.
    ///
    /// `confirm_rerun` is only consulted by bring-to-top on an applied
    /// migration. A successful mutating action is followed by a schema dump
    /// whose failure is logged, not returned.
    pub fn execute<F>(
        &mut self,
        action: ActionKind,
        migration: &Migration,
        confirm_rerun: F,
    ) -> Result<ActionOutcome, ActionError>
    where
        F: FnOnce() -> bool,
    {
        ensure_actionable(migration)?;

        let result = match action {
            ActionKind::Cancel => return Ok(ActionOutcome::Cancelled),
            ActionKind::Up => self.adapter.up(migration),
            ActionKind::Down => self.adapter.down(migration),
            ActionKind::Redo => self.adapter.redo(migration),
            ActionKind::Migrate => self.adapter.migrate(migration),
            ActionKind::Rollback => self.adapter.rollback(migration),
            ActionKind::BringToTop => {
                let to = bring_to_top(migration, &mut *self.adapter, self.stamper, confirm_rerun)?;
                self.dump_schema();
                return Ok(ActionOutcome::Moved {
                    from: migration.version,
                    to,
                });
            }
        };

        result.map_err(|e| {
            warn!(version = migration.version, %action, error = %e, "action failed");
            ActionError::execution_failed(&e)
        })?;

        info!(version = migration.version, %action, "action completed");
        self.dump_schema();
        Ok(ActionOutcome::Completed)
    }

    fn dump_schema(&self) {
        if let Err(e) = self.dumper.dump() {
            warn!(error = %e, "schema dump failed");
        }
    }
}
