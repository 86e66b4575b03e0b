mod common;

use common::{date, memory_ledger};
use expense_ledger::{
    export::{self, HEADER},
    ledger::{parse_date, TransactionKind, DEFAULT_DISPLAY_FORMAT, VISIBLE_LIMIT},
};

type Row = (String, String, String, f64, String);

fn parse_rows(text: &str) -> Vec<Row> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().expect("header row").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>().join(","), HEADER);
    reader
        .records()
        .map(|record| {
            let record = record.expect("valid csv row");
            (
                record[0].to_string(),
                record[1].to_string(),
                record[2].to_string(),
                record[3].parse().expect("numeric amount"),
                record[4].to_string(),
            )
        })
        .collect()
}

#[test]
fn export_roundtrips_every_transaction() {
    let (mut ledger, _store) = memory_ledger(date(2024, 5, 1));
    for n in 0..(VISIBLE_LIMIT + 20) {
        let kind = if n % 5 == 0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };
        ledger
            .add(
                kind,
                &format!("Entry {n}"),
                10.0 + n as f64 / 4.0,
                "Other",
                date(2024, 4, 1 + (n % 28) as u32),
            )
            .unwrap();
    }
    ledger
        .add(TransactionKind::Expense, "Dinner, \"fancy\"", 2500.5, "Food", date(2024, 4, 30))
        .unwrap();
    ledger.set_filter(Some(0)).unwrap();

    let rows = parse_rows(&ledger.export());
    assert_eq!(rows.len(), ledger.len());
    assert!(rows.len() > VISIBLE_LIMIT);

    for (row, txn) in rows.iter().zip(ledger.transactions()) {
        assert_eq!(parse_date(&row.0).unwrap(), txn.date);
        assert_eq!(row.1, txn.description);
        assert_eq!(row.2, txn.category);
        assert_eq!(row.3, txn.amount);
        assert_eq!(row.4, txn.kind.as_str());
    }
}

#[test]
fn export_text_matches_expected_layout() {
    let (mut ledger, _store) = memory_ledger(date(2024, 1, 20));
    ledger
        .add(TransactionKind::Income, "Salary", 50000.0, "Salary", date(2024, 1, 1))
        .unwrap();
    ledger
        .add(TransactionKind::Expense, "Groceries", 1200.0, "Food", date(2024, 1, 5))
        .unwrap();

    assert_eq!(ledger.date_format(), DEFAULT_DISPLAY_FORMAT);
    assert_eq!(
        ledger.export(),
        "Date,Description,Category,Amount,Type\n\
         5/1/2024,\"Groceries\",Food,1200,expense\n\
         1/1/2024,\"Salary\",Salary,50000,income\n"
    );
    assert_eq!(
        export::export_file_name(ledger.today()),
        "expenses_2024-01-20.csv"
    );
}

#[test]
fn iso_date_format_is_supported() {
    let (mut ledger, _store) = memory_ledger(date(2024, 1, 20));
    ledger
        .add(TransactionKind::Expense, "Tea", 20.0, "Food", date(2024, 1, 2))
        .unwrap();
    ledger.set_date_format("%Y-%m-%d").unwrap();
    let rows = parse_rows(&ledger.export());
    assert_eq!(rows[0].0, "2024-01-02");
}
