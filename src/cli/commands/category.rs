use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "category",
        "List categories or add a new one",
        "category [list|add <name>]",
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["list"] => {
            output::section("Categories");
            for category in &context.config.categories {
                let marker = if *category == context.config.default_category {
                    " (default)"
                } else {
                    ""
                };
                output::info(format!("  {category}{marker}"));
            }
            Ok(())
        }
        ["add", name @ ..] if !name.is_empty() => {
            let name = name.join(" ");
            if !context.config.add_category(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "category `{}` already exists or is blank",
                    name.trim()
                )));
            }
            context.save_config()?;
            output::success(format!("Added category `{}`.", name.trim()));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: category [list|add <name>]".into(),
        )),
    }
}
