//! Shell state, command dispatch and error reporting.

use std::io;

use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    errors::{ConfigError, LedgerError, PersistenceError, ValidationError},
    ledger::{Clock, Ledger, MonthFilter, SystemClock},
    storage::{JsonStore, MemoryStore},
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::output::{self, OutputPreferences};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(err) => CommandError::Validation(err),
            LedgerError::Persistence(err) => CommandError::Persistence(err),
        }
    }
}

/// Failures that end the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

pub struct ShellContext {
    pub(crate) ledger: Ledger,
    pub(crate) config: Config,
    config_manager: ConfigManager,
    registry: CommandRegistry,
    mode: CliMode,
    pub(crate) running: bool,
}

impl ShellContext {
    /// Builds a context from the on-disk configuration and data directory.
    ///
    /// Unreadable data is reported and replaced by an empty session so the
    /// shell stays usable.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load().unwrap_or_else(|err| {
            output::warning(format!("Could not read configuration, using defaults: {err}"));
            Config::default()
        });

        let ledger = match JsonStore::new_default() {
            Ok(store) => open_stored_ledger(store, SystemClock),
            Err(err) => {
                output::warning(format!(
                    "Storage unavailable ({err}); transactions will not be saved."
                ));
                Ledger::empty(Box::new(MemoryStore::new()), Box::new(SystemClock))
            }
        };

        Ok(Self::with_parts(mode, ledger, config, config_manager))
    }

    pub fn with_parts(
        mode: CliMode,
        mut ledger: Ledger,
        config: Config,
        config_manager: ConfigManager,
    ) -> Self {
        if let Err(err) = ledger.set_date_format(&config.date_format) {
            output::warning(format!("Keeping the default date format: {err}"));
        }
        let context = Self {
            ledger,
            config,
            config_manager,
            registry: CommandRegistry::new(commands::all_definitions()),
            mode,
            running: true,
        };
        context.apply_output_preferences();
        context
    }

    pub fn mode(&self) -> CliMode {
        self.mode
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn save_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn apply_output_preferences(&self) {
        output::set_preferences(OutputPreferences {
            theme: self.config.theme,
            plain: self.mode == CliMode::Script || std::env::var_os("NO_COLOR").is_some(),
        });
    }

    pub(crate) fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn prompt(&self) -> String {
        match self.ledger.filter() {
            MonthFilter::All => "ledger> ".to_string(),
            MonthFilter::Month(month) => format!("ledger [{}]> ", month.name()),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|def| def.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let needle = input.to_ascii_lowercase();
        let closest = self
            .registry
            .iter()
            .map(|def: &CommandDefinition| (levenshtein(&needle, def.name), def.name))
            .filter(|(distance, _)| *distance <= 2)
            .min_by_key(|(distance, _)| *distance);
        if let Some((_, name)) = closest {
            output::hint(format!("Did you mean `{name}`?"));
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Validation(err) => {
                output::warning(format!("Invalid input: {err}"));
            }
            CommandError::Persistence(err) => {
                output::warning(format!(
                    "Could not save changes ({err}); they are kept for this session only."
                ));
            }
            other => output::error(other.to_string()),
        }
        Ok(())
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt("Exit the shell?")
            .default(true)
            .interact()
            .map_err(CliError::from)
    }
}

/// Opens the ledger persisted in `store`.
///
/// A document that cannot be read is moved aside before the session starts so
/// later saves cannot replace it. If it cannot be moved the session runs on an
/// in-memory store instead.
pub(crate) fn open_stored_ledger<C>(store: JsonStore, clock: C) -> Ledger
where
    C: Clock + Copy + 'static,
{
    let err = match Ledger::open_with_clock(Box::new(store.clone()), Box::new(clock)) {
        Ok(ledger) => return ledger,
        Err(err) => err,
    };
    let clock = Box::new(clock);
    match store.quarantine() {
        Ok(Some(moved)) => {
            output::warning(format!(
                "Could not read saved transactions ({err}); moved them to {} and started empty.",
                moved.display()
            ));
            Ledger::empty(Box::new(store), clock)
        }
        Ok(None) => {
            output::warning(format!("Could not read saved transactions ({err}); starting empty."));
            Ledger::empty(Box::new(store), clock)
        }
        Err(move_err) => {
            output::warning(format!(
                "Could not read saved transactions ({err}) or move them aside ({move_err}); \
                 changes will not be saved."
            ));
            Ledger::empty(Box::new(MemoryStore::new()), clock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FixedClock, TransactionKind};
    use crate::storage::TransactionStore;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn unreadable_history_survives_the_next_save() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path()).unwrap();
        let truncated = r#"[{"id":1,"type":"income","desc":"Salary","amount":50000,"#;
        fs::write(store.path(), truncated).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let mut ledger = open_stored_ledger(store.clone(), FixedClock::new(today));
        assert!(ledger.is_empty());
        ledger
            .add(TransactionKind::Expense, "Tea", 20.0, "Food", today)
            .unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
        let kept: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path != &store.path())
            .collect();
        assert_eq!(kept.len(), 1, "{kept:?}");
        assert_eq!(fs::read_to_string(&kept[0]).unwrap(), truncated);
    }

    #[test]
    fn readable_history_opens_normally() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let mut first = open_stored_ledger(store.clone(), FixedClock::new(today));
        first
            .add(TransactionKind::Income, "Salary", 50000.0, "Salary", today)
            .unwrap();

        let reopened = open_stored_ledger(store, FixedClock::new(today));
        assert_eq!(reopened.len(), 1);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
