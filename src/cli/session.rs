//! Interactive session loop
//!
//! Each iteration rebuilds the catalog from the adapter, asks the operator
//! for a migration and an action, and runs it through the executor. Action
//! failures are displayed and the loop goes on. The loop ends when the
//! operator picks "done" or interrupts a prompt.

use thiserror::Error;
use tracing::debug;

use crate::migrations::{
    build_catalog, ensure_actionable, menu_actions, ActionError, ActionExecutor, ActionKind,
    ActionOutcome, Migration, MigrationStatus,
};

use super::errors::{CliError, CliResult};

/// Whether the session keeps going after an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// Ctrl-C or an equivalent hard stop
    #[error("prompt interrupted")]
    Interrupted,

    #[error("prompt failed: {0}")]
    Failed(String),
}

pub type PromptResult<T> = Result<T, PromptError>;

/// Operator-facing side of the console
pub trait Prompter {
    /// Pick a migration; `None` means the operator is done.
    fn select_migration(&mut self, catalog: &[Migration]) -> PromptResult<Option<Migration>>;

    /// Pick one of `actions` for `migration`.
    fn select_action(
        &mut self,
        migration: &Migration,
        actions: &[ActionKind],
    ) -> PromptResult<ActionKind>;

    /// Whether an applied migration is run down and up again around the
    /// move; `None` backs out of the action.
    fn confirm_rerun(&mut self, migration: &Migration) -> PromptResult<Option<bool>>;

    fn show_outcome(&mut self, migration: &Migration, action: ActionKind, outcome: &ActionOutcome);

    fn show_error(&mut self, error: &ActionError);

    fn notice(&mut self, message: &str);

    /// Block until the operator has seen the last message.
    fn acknowledge(&mut self) -> PromptResult<()>;
}

/// The console: one executor, one prompter
pub struct Session<'a, P: Prompter + ?Sized> {
    executor: ActionExecutor<'a>,
    prompter: &'a mut P,
}

impl<'a, P: Prompter + ?Sized> Session<'a, P> {
    pub fn new(executor: ActionExecutor<'a>, prompter: &'a mut P) -> Self {
        Self { executor, prompter }
    }

    /// Loop until done. Interrupts end the session cleanly.
    pub fn run(&mut self) -> CliResult<()> {
        while self.step()? == Flow::Continue {}
        debug!("session finished");
        Ok(())
    }

    /// One pass: reload, select, act.
    pub fn step(&mut self) -> CliResult<Flow> {
        let catalog = match build_catalog(self.executor.adapter()) {
            Ok(catalog) => catalog,
            Err(e) => {
                let err = CliError::from(e);
                self.prompter
                    .notice(&format!("Could not load migrations: {}", err.message()));
                return Err(err);
            }
        };

        if catalog.is_empty() {
            self.prompter.notice("No migrations found.");
            return Ok(Flow::Done);
        }

        let Some(migration) = answer(self.prompter.select_migration(&catalog))?.flatten() else {
            return Ok(Flow::Done);
        };

        if let Err(e) = ensure_actionable(&migration) {
            return self.report(&e);
        }

        let actions = menu_actions(migration.status);
        let Some(action) = answer(self.prompter.select_action(&migration, &actions))? else {
            return Ok(Flow::Done);
        };
        if action == ActionKind::Cancel {
            return Ok(Flow::Continue);
        }

        // Asked before the executor runs so an interrupt leaves nothing half done
        let rerun = if action == ActionKind::BringToTop && migration.status == MigrationStatus::Up
        {
            match answer(self.prompter.confirm_rerun(&migration))? {
                Some(Some(rerun)) => rerun,
                Some(None) => return Ok(Flow::Continue),
                None => return Ok(Flow::Done),
            }
        } else {
            false
        };

        match self.executor.execute(action, &migration, || rerun) {
            Ok(outcome) => {
                self.prompter.show_outcome(&migration, action, &outcome);
                Ok(Flow::Continue)
            }
            Err(e) => self.report(&e),
        }
    }

    fn report(&mut self, error: &ActionError) -> CliResult<Flow> {
        self.prompter.show_error(error);
        match answer(self.prompter.acknowledge())? {
            Some(()) => Ok(Flow::Continue),
            None => Ok(Flow::Done),
        }
    }
}

/// `None` when the operator interrupted the prompt.
fn answer<T>(result: PromptResult<T>) -> CliResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PromptError::Interrupted) => Ok(None),
        Err(PromptError::Failed(message)) => Err(CliError::prompt_failed(message)),
    }
}
