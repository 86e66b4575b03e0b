//! CSV export of the full transaction list.

use chrono::NaiveDate;

use crate::ledger::Transaction;

pub const HEADER: &str = "Date,Description,Category,Amount,Type";

/// Serializes `transactions` in order, one newline-terminated row each.
///
/// The description column is always quoted; the category is quoted only when
/// it would otherwise break the row. Amounts are written unquoted in their
/// shortest decimal form.
pub fn to_csv(transactions: &[Transaction], date_format: &str) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + transactions.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for txn in transactions {
        out.push_str(&row(txn, date_format));
        out.push('\n');
    }
    out
}

fn row(txn: &Transaction, date_format: &str) -> String {
    format!(
        "{},{},{},{},{}",
        escape_field(&txn.display_date(date_format)),
        quote(&txn.description),
        escape_field(&txn.category),
        txn.amount,
        txn.kind
    )
}

/// File name for an export taken on `date`, e.g. `expenses_2024-01-31.csv`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("expenses_{}.csv", date.format("%Y-%m-%d"))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn escape_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        quote(value)
    } else {
        value.to_string()
    }
}
