use std::fs;
use std::path::PathBuf;

use chrono::{Datelike, Month};

use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::table::{Alignment, Table, TableColumn};
use crate::export;
use crate::ledger::{MonthFilter, VISIBLE_LIMIT};

const FILTER_USAGE: &str = "filter <current|all|1-12|month name>";
const DESCRIPTION_WIDTH: usize = 32;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "list",
            "List the most recent transactions in the active filter",
            "list",
            cmd_list,
        ),
        CommandDefinition::new(
            "summary",
            "Show balance, totals and period expenses",
            "summary",
            cmd_summary,
        ),
        CommandDefinition::new(
            "filter",
            "Restrict the list to a month of the current year",
            FILTER_USAGE,
            cmd_filter,
        ),
        CommandDefinition::new(
            "export",
            "Write every transaction to a CSV file (`-` for stdout)",
            "export [path|-]",
            cmd_export,
        ),
    ]
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    render_list(context);
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.ledger.summary();
    let config = &context.config;

    let period_label = match context.ledger.filter() {
        MonthFilter::All => "Period expenses".to_string(),
        MonthFilter::Month(month) => {
            format!("{} {} expenses", month.name(), context.ledger.today().year())
        }
    };

    output::section("Summary");
    output::info(format!(
        "  Balance         : {}",
        output::money(config.format_amount(summary.balance), !summary.is_negative())
    ));
    output::info(format!(
        "  Total income    : {}",
        config.format_amount(summary.total_income)
    ));
    output::info(format!(
        "  Total expenses  : {}",
        config.format_amount(summary.total_expenses)
    ));
    output::info(format!(
        "  {:<16}: {}",
        period_label,
        config.format_amount(summary.period_expenses)
    ));
    Ok(())
}

fn cmd_filter(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [raw] = args else {
        if args.is_empty() {
            output::info(format!("Showing {}.", context.ledger.filter()));
            return Ok(());
        }
        return Err(CommandError::InvalidArguments(format!("usage: {FILTER_USAGE}")));
    };

    match raw.to_ascii_lowercase().as_str() {
        "current" | "month" | "this" => context.ledger.filter_current_month(),
        "all" | "none" => context.ledger.set_filter(None)?,
        other => {
            let index = parse_month(other).ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "`{raw}` is not a month; use 1-12 or a month name"
                ))
            })?;
            context.ledger.set_filter(Some(index))?;
        }
    }

    render_list(context);
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let csv = context.ledger.export();
    if args.first() == Some(&"-") {
        print!("{csv}");
        return Ok(());
    }

    let file_name = export::export_file_name(context.ledger.today());
    let path = match args {
        [] => PathBuf::from(&file_name),
        [target] => {
            let target = PathBuf::from(*target);
            if target.is_dir() {
                target.join(&file_name)
            } else {
                target
            }
        }
        _ => return Err(CommandError::InvalidArguments("usage: export [path|-]".into())),
    };

    fs::write(&path, csv)?;
    output::success(format!(
        "Exported {} transaction(s) to {}",
        context.ledger.len(),
        path.display()
    ));
    Ok(())
}

/// Zero-based month index from `1`-`12` or an English month name.
fn parse_month(raw: &str) -> Option<u32> {
    if let Ok(number) = raw.parse::<u32>() {
        return (1..=12).contains(&number).then(|| number - 1);
    }
    raw.parse::<Month>()
        .ok()
        .map(|month| month.number_from_month() - 1)
}

fn render_list(context: &ShellContext) {
    let ledger = &context.ledger;
    let config = &context.config;
    let visible = ledger.visible();

    output::section(format!("Transactions ({})", ledger.filter()));
    if visible.is_empty() {
        output::info("No transactions yet.");
        return;
    }

    let mut table = Table::new(vec![
        TableColumn::new("ID", Alignment::Left),
        TableColumn::new("Date", Alignment::Left),
        TableColumn::new("Description", Alignment::Left).max_width(DESCRIPTION_WIDTH),
        TableColumn::new("Category", Alignment::Left),
        TableColumn::new("Amount", Alignment::Right),
    ]);
    for txn in &visible {
        let amount = format!("{}{}", txn.kind.sign(), config.format_amount(txn.amount));
        table.push_row(vec![
            txn.id.to_string(),
            txn.display_date(ledger.date_format()),
            txn.description.clone(),
            txn.category.clone(),
            output::money(amount, txn.is_income()),
        ]);
    }
    output::info(table.render());

    if visible.len() == VISIBLE_LIMIT {
        output::hint(format!(
            "Showing the {VISIBLE_LIMIT} most recent entries; use `export` for the full history."
        ));
    }
}
