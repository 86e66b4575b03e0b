//! Terminal presentation layer: a shell that drives the ledger and renders its output.

pub mod commands;
pub mod context;
pub mod output;
mod shell;
pub mod table;

pub use context::{CliError, CliMode, ShellContext};
pub use shell::{run_cli, run_with_context, SCRIPT_ENV};
