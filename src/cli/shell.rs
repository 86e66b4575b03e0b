use std::io::{self, BufRead};

use chrono::Month;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    history::DefaultHistory,
    Cmd, Context as ReadlineContext, Editor, KeyEvent,
};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use shell_words::split;

use crate::cli::context::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;

/// Setting this variable switches the shell to reading commands from stdin.
pub const SCRIPT_ENV: &str = "EXPENSE_LEDGER_SCRIPT";

const KINDS: &[&str] = &["income", "expense"];
const FILTER_KEYWORDS: &[&str] = &["current", "all"];
const CATEGORY_ACTIONS: &[&str] = &["list", "add"];
const THEMES: &[&str] = &["light", "dark", "toggle"];
const CONFIRM_FLAGS: &[&str] = &["--yes"];
/// Position of the category argument in `add <kind> <description> <amount> [category]`.
const ADD_CATEGORY_POSITION: usize = 4;

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    run_with_context(&mut context)
}

/// Runs the loop for an already-built context.
pub fn run_with_context(context: &mut ShellContext) -> Result<(), CliError> {
    match context.mode() {
        CliMode::Interactive => run_interactive(context),
        CliMode::Script => run_script(context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<LedgerCompleter, DefaultHistory>::new()?;
    editor.set_helper(Some(LedgerCompleter::new(context.command_names())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    while context.running {
        // categories can change between lines
        if let Some(helper) = editor.helper_mut() {
            helper.categories = context.config().categories.clone();
        }

        let line = match editor.readline(&context.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
                continue;
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        editor.add_history_entry(trimmed).ok();
        if run_line(context, trimmed)? == LoopControl::Exit {
            break;
        }
    }

    Ok(())
}

/// Reads one command per line. Blank lines and `#` comments are skipped.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if run_line(context, trimmed)? == LoopControl::Exit || !context.running {
            break;
        }
    }
    Ok(())
}

fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    match handle_line(context, line) {
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse `{line}`: {err}"));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    tracing::debug!(%command, args = args.len(), "dispatching command");

    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Tab completion for command names and the fixed vocabularies of their
/// arguments: transaction kinds, categories, months, themes.
#[derive(Helper, Hinter, Highlighter, Validator)]
struct LedgerCompleter {
    commands: Vec<String>,
    categories: Vec<String>,
    months: Vec<String>,
}

impl LedgerCompleter {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_ascii_lowercase).collect();
        commands.sort();
        commands.dedup();
        let months = (1..=12u8)
            .filter_map(|number| Month::try_from(number).ok())
            .map(|month| month.name().to_ascii_lowercase())
            .collect();
        Self {
            commands,
            categories: Vec::new(),
            months,
        }
    }

    /// Start offset of the word under the cursor and the words that may replace it.
    fn candidates(&self, prefix: &str) -> (usize, Vec<String>) {
        let start = prefix
            .rfind(|c: char| c == ' ' || c == '\t')
            .map_or(0, |idx| idx + 1);
        // An unterminated quote means the cursor sits inside a description.
        let Ok(before) = split(&prefix[..start]) else {
            return (start, Vec::new());
        };

        let command = before.first().map(|word| word.to_ascii_lowercase());
        let pool: Vec<&str> = match (command.as_deref(), before.len()) {
            (None, _) => self.commands.iter().map(String::as_str).collect(),
            (Some("help"), 1) => self.commands.iter().map(String::as_str).collect(),
            (Some("add"), 1) => KINDS.to_vec(),
            (Some("add"), ADD_CATEGORY_POSITION) => {
                self.categories.iter().map(String::as_str).collect()
            }
            (Some("filter"), 1) => FILTER_KEYWORDS
                .iter()
                .copied()
                .chain(self.months.iter().map(String::as_str))
                .collect(),
            (Some("category"), 1) => CATEGORY_ACTIONS.to_vec(),
            (Some("theme"), 1) => THEMES.to_vec(),
            (Some("clear"), 1) => CONFIRM_FLAGS.to_vec(),
            _ => Vec::new(),
        };

        let needle = prefix[start..].to_lowercase();
        let matches = pool
            .into_iter()
            .filter(|word| word.to_lowercase().starts_with(&needle))
            .map(str::to_string)
            .collect();
        (start, matches)
    }
}

impl Completer for LedgerCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}
