//! # Action Policy
//!
//! Which operations an operator may run on a migration, by status.

use super::MigrationStatus;
use std::fmt;

/// An operation offered in the action menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Up,
    Down,
    Redo,
    Migrate,
    Rollback,
    BringToTop,
    /// Leaves the menu without touching anything
    Cancel,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Redo => "redo",
            Self::Migrate => "migrate to here",
            Self::Rollback => "rollback to here",
            Self::BringToTop => "bring to top",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const COMMON_ACTIONS: [ActionKind; 3] = [
    ActionKind::Migrate,
    ActionKind::Rollback,
    ActionKind::BringToTop,
];

/// Legal actions for a status, status-specific ones first.
pub fn legal_actions(status: MigrationStatus) -> Vec<ActionKind> {
    let specific: &[ActionKind] = match status {
        MigrationStatus::Up => &[ActionKind::Down, ActionKind::Redo],
        MigrationStatus::Down => &[ActionKind::Up],
    };

    specific.iter().chain(COMMON_ACTIONS.iter()).copied().collect()
}

/// What the action menu shows: the legal actions plus `Cancel`.
pub fn menu_actions(status: MigrationStatus) -> Vec<ActionKind> {
    let mut actions = legal_actions(status);
    actions.push(ActionKind::Cancel);
    actions
}
