use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::config::Theme;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "theme",
        "Show or switch between the light and dark colour themes",
        "theme [light|dark|toggle]",
        cmd_theme,
    )]
}

fn cmd_theme(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let theme = match args {
        [] => {
            output::info(format!("Current theme: {}", context.config.theme));
            return Ok(());
        }
        ["toggle"] => context.config.theme.toggled(),
        [value] => value
            .parse::<Theme>()
            .map_err(CommandError::InvalidArguments)?,
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: theme [light|dark|toggle]".into(),
            ))
        }
    };

    context.config.theme = theme;
    context.apply_output_preferences();
    context.save_config()?;
    output::success(format!("Theme set to {theme}."));
    Ok(())
}
