use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let Some(command) = context.registry().get(&name.to_lowercase()) else {
            return Err(CommandError::InvalidArguments(format!(
                "no help for unknown command `{name}`"
            )));
        };
        output::section(format!("Help: {}", command.name));
        output::info(format!("  Description: {}", command.description));
        output::info(format!("  Usage: {}", command.usage));
        return Ok(());
    }

    output::section("Available commands");
    for command in context.registry().iter() {
        output::info(format!("  {:<10} {}", command.name, command.description));
    }
    output::info("Use `help <command>` for details.");
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
