//! Terminal prompts for the console, built on `inquire`
//!
//! Key mapping:
//! - Esc on the migration list: done
//! - Esc on the action menu: cancel
//! - Esc on the rerun question: back to the list
//! - Ctrl-C anywhere: done

use std::fmt;

use console::{style, Key, Term};
use inquire::{Confirm, InquireError, Select};

use crate::migrations::{ActionError, ActionKind, ActionOutcome, Migration};

use super::session::{PromptError, PromptResult, Prompter};

const MIN_PAGE_SIZE: usize = 5;

/// Row of the migration list
enum ListEntry {
    Migration(Migration),
    Done,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migration(migration) => fmt::Display::fmt(migration, f),
            Self::Done => f.write_str("[done]"),
        }
    }
}

/// [`Prompter`] for an interactive terminal
pub struct InquirePrompter {
    term: Term,
    /// Cursor position kept across reloads
    cursor: usize,
}

impl InquirePrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            cursor: 0,
        }
    }

    fn page_size(&self) -> usize {
        let (rows, _) = self.term.size();
        (rows as usize).saturating_sub(4).max(MIN_PAGE_SIZE)
    }
}

impl Default for InquirePrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_error(err: InquireError) -> PromptError {
    match err {
        InquireError::OperationInterrupted => PromptError::Interrupted,
        other => PromptError::Failed(other.to_string()),
    }
}

/// Esc becomes `None`, everything else goes through [`prompt_error`].
fn skippable<T>(result: Result<T, InquireError>) -> PromptResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(prompt_error(e)),
    }
}

impl Prompter for InquirePrompter {
    fn select_migration(&mut self, catalog: &[Migration]) -> PromptResult<Option<Migration>> {
        let mut entries: Vec<ListEntry> = catalog.iter().cloned().map(ListEntry::Migration).collect();
        entries.push(ListEntry::Done);
        let cursor = self.cursor.min(entries.len() - 1);

        let choice = skippable(
            Select::new("Migrations (newest first):", entries)
                .with_starting_cursor(cursor)
                .with_page_size(self.page_size())
                .with_help_message("↑↓ to move, enter to select, esc when done")
                .raw_prompt(),
        )?;

        match choice {
            Some(choice) => {
                self.cursor = choice.index;
                match choice.value {
                    ListEntry::Migration(migration) => Ok(Some(migration)),
                    ListEntry::Done => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    fn select_action(
        &mut self,
        migration: &Migration,
        actions: &[ActionKind],
    ) -> PromptResult<ActionKind> {
        let message = format!("{} {}:", migration.version, migration.name);
        let choice = Select::new(&message, actions.to_vec())
            .with_page_size(actions.len().max(1))
            .prompt_skippable()
            .map_err(prompt_error)?;

        Ok(choice.unwrap_or(ActionKind::Cancel))
    }

    fn confirm_rerun(&mut self, migration: &Migration) -> PromptResult<Option<bool>> {
        let message = format!(
            "{} is applied. Run it down before the move and up again after?",
            migration.name
        );
        Confirm::new(&message)
            .with_default(false)
            .with_help_message("no keeps it applied and only renumbers the ledger row")
            .prompt_skippable()
            .map_err(prompt_error)
    }

    fn show_outcome(&mut self, migration: &Migration, action: ActionKind, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Completed => println!(
                "{} {} {} {}",
                style("✔").green(),
                action,
                migration.version,
                migration.name
            ),
            ActionOutcome::Moved { from, to } => println!(
                "{} moved {} from {} to {}",
                style("✔").green(),
                migration.name,
                from,
                style(to).bold()
            ),
            ActionOutcome::Cancelled => {}
        }
    }

    fn show_error(&mut self, error: &ActionError) {
        eprintln!("{} {}", style("✘").red().bold(), style(error).red());
        for frame in error.trace() {
            eprintln!("    {}", style(frame).dim());
        }
    }

    fn notice(&mut self, message: &str) {
        println!("{}", style(message).yellow());
    }

    fn acknowledge(&mut self) -> PromptResult<()> {
        eprintln!("{}", style("Press any key to continue").dim());
        match self.term.read_key() {
            Ok(Key::CtrlC) => Err(PromptError::Interrupted),
            Ok(_) => Ok(()),
            Err(e) => Err(PromptError::Failed(e.to_string())),
        }
    }
}
