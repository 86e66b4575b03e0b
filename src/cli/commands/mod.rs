use std::collections::HashMap;

pub mod category;
pub mod config;
pub mod report;
pub mod system;
pub mod transaction;

use crate::cli::context::{CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(transaction::definitions());
    commands.extend(report::definitions());
    commands.extend(category::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Command lookup by name (and alias) that preserves registration order for help output.
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    aliases: HashMap<&'static str, &'static str>,
    order: Vec<&'static str>,
}

const ALIASES: &[(&str, &str)] = &[("quit", "exit"), ("rm", "delete"), ("ls", "list")];

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        let aliases = ALIASES
            .iter()
            .filter(|(_, target)| commands.contains_key(*target))
            .copied()
            .collect();
        Self {
            commands,
            aliases,
            order,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        let name = self.aliases.get(name).copied().unwrap_or(name);
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order
            .iter()
            .copied()
            .chain(self.aliases.keys().copied())
    }
}
