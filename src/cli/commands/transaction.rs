use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::ledger::{parse_amount, parse_date, TransactionId, TransactionKind};

const ADD_USAGE: &str = "add <income|expense> <description> <amount> [category] [date]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record an income or expense", ADD_USAGE, cmd_add),
        CommandDefinition::new(
            "delete",
            "Delete a transaction by id",
            "delete <id>",
            cmd_delete,
        ),
        CommandDefinition::new(
            "clear",
            "Delete every transaction (cannot be undone)",
            "clear [--yes]",
            cmd_clear,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, description, amount, rest @ ..] = args else {
        return Err(CommandError::InvalidArguments(format!("usage: {ADD_USAGE}")));
    };
    if rest.len() > 2 {
        return Err(CommandError::InvalidArguments(format!("usage: {ADD_USAGE}")));
    }

    let kind: TransactionKind = kind.parse().map_err(CommandError::InvalidArguments)?;
    let amount = parse_amount(amount)?;
    let category = match rest.first() {
        Some(name) => context
            .config
            .find_category(name)
            .map(str::to_string)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "unknown category `{name}`; add it first with `category add {name}`"
                ))
            })?,
        None => context.config.default_category.clone(),
    };
    let date = match rest.get(1) {
        Some(raw) => parse_date(raw)?,
        None => context.ledger.today(),
    };

    let transaction = context
        .ledger
        .add(kind, description, amount, &category, date)?;
    output::success(format!(
        "Added {} #{}: {} {}",
        transaction.kind,
        transaction.id,
        transaction.description,
        context.config.format_amount(transaction.amount)
    ));
    print_balance(context);
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [raw] = args else {
        return Err(CommandError::InvalidArguments("usage: delete <id>".into()));
    };
    let id: TransactionId = raw
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a transaction id")))?;

    match context.ledger.delete(id)? {
        Some(removed) => {
            output::success(format!("Deleted #{}: {}", removed.id, removed.description));
            print_balance(context);
        }
        None => output::info(format!("No transaction with id {id}.")),
    }
    Ok(())
}

fn cmd_clear(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let confirmed = match args {
        ["--yes"] | ["-y"] => true,
        [] if context.mode() == CliMode::Interactive => dialoguer::Confirm::new()
            .with_prompt("Delete all transactions? This cannot be undone.")
            .default(false)
            .interact()?,
        [] => {
            return Err(CommandError::InvalidArguments(
                "use `clear --yes` to confirm in script mode".into(),
            ))
        }
        _ => return Err(CommandError::InvalidArguments("usage: clear [--yes]".into())),
    };
    if !confirmed {
        output::info("Nothing deleted.");
        return Ok(());
    }

    let count = context.ledger.len();
    context.ledger.clear_all()?;
    output::success(format!("Deleted {count} transaction(s)."));
    Ok(())
}

fn print_balance(context: &ShellContext) {
    let summary = context.ledger.summary();
    output::info(format!(
        "Balance: {}",
        output::money(
            context.config.format_amount(summary.balance),
            !summary.is_negative()
        )
    ));
}
