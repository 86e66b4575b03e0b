mod common;

use std::fs;

use common::{date, json_ledger, temp_dir};
use expense_ledger::{
    errors::PersistenceError,
    ledger::{FixedClock, Ledger, TransactionKind},
    storage::{JsonStore, TransactionStore},
};

#[test]
fn ledger_survives_reopen() {
    let (mut ledger, store) = json_ledger(date(2024, 2, 1));
    let rent = ledger
        .add(TransactionKind::Expense, "Rent", 15000.0, "Bills", date(2024, 2, 1))
        .unwrap();
    let pay = ledger
        .add(TransactionKind::Income, "Pay", 60000.0, "Salary", date(2024, 2, 1))
        .unwrap();
    drop(ledger);

    let reopened = Ledger::open_with_clock(
        Box::new(store.clone()),
        Box::new(FixedClock::new(date(2024, 2, 2))),
    )
    .expect("reopen");
    assert_eq!(reopened.transactions(), &[pay, rent]);
}

#[test]
fn stored_document_uses_record_field_names() {
    let (mut ledger, store) = json_ledger(date(2024, 2, 1));
    ledger
        .add(TransactionKind::Expense, "Milk", 60.0, "Food", date(2024, 2, 1))
        .unwrap();

    let raw = fs::read_to_string(store.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().expect("array of records")[0];
    for field in ["id", "type", "desc", "amount", "category", "date"] {
        assert!(record.get(field).is_some(), "missing `{field}` in {record}");
    }
    assert_eq!(record["date"], "2024-02-01");
}

#[test]
fn legacy_display_dates_are_restored() {
    let dir = temp_dir();
    let store = JsonStore::new(&dir).unwrap();
    fs::write(
        store.path(),
        r#"[{"id":1704450000000,"type":"expense","desc":"Groceries","amount":1200,
             "category":"Food","date":"5/1/2024"},
            {"id":1704067200000,"type":"income","desc":"Salary","amount":50000,
             "category":"Salary","date":"1/1/2024"}]"#,
    )
    .unwrap();

    let mut ledger = Ledger::open_with_clock(
        Box::new(store),
        Box::new(FixedClock::new(date(2024, 1, 31))),
    )
    .unwrap();
    assert_eq!(ledger.transactions()[0].date, date(2024, 1, 5));

    ledger.filter_current_month();
    assert_eq!(ledger.visible().len(), 2);
    assert_eq!(ledger.summary().period_expenses, 1200.0);
}

#[test]
fn corrupt_document_fails_to_open() {
    let dir = temp_dir();
    let store = JsonStore::new(&dir).unwrap();
    fs::write(store.path(), "{ not a list").unwrap();

    let err = Ledger::open(Box::new(store)).expect_err("corrupt data must be reported");
    assert!(matches!(err, PersistenceError::Serde { .. }), "{err:?}");
}

#[test]
fn clear_all_deletes_the_file() {
    let (mut ledger, store) = json_ledger(date(2024, 2, 1));
    ledger
        .add(TransactionKind::Expense, "Fuel", 2000.0, "Transport", date(2024, 2, 1))
        .unwrap();
    assert!(store.path().exists());

    ledger.clear_all().unwrap();
    assert!(!store.path().exists());
    assert!(!store.contains().unwrap());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn failed_write_keeps_session_state() {
    let (mut ledger, store) = json_ledger(date(2024, 2, 1));
    // A directory where the staging file should go makes every save fail.
    let mut tmp = store.path();
    tmp.set_extension("json.tmp");
    fs::create_dir_all(&tmp).unwrap();

    let err = ledger
        .add(TransactionKind::Expense, "Books", 800.0, "Shopping", date(2024, 2, 1))
        .expect_err("save must fail");
    assert!(!err.is_validation());
    assert_eq!(ledger.len(), 1);
    assert!(!store.path().exists());
}

#[test]
fn unreadable_document_is_set_aside_before_new_writes() {
    let dir = temp_dir();
    let store = JsonStore::new(&dir).unwrap();
    let truncated = r#"[{"id":1,"type":"income","desc":"Salary","amount":50000,"category":"Sal"#;
    fs::write(store.path(), truncated).unwrap();

    let clock = FixedClock::new(date(2024, 1, 20));
    assert!(Ledger::open_with_clock(Box::new(store.clone()), Box::new(clock)).is_err());

    let moved = store.quarantine().unwrap().expect("document existed");
    let mut ledger = Ledger::empty(Box::new(store.clone()), Box::new(clock));
    ledger
        .add(TransactionKind::Expense, "Tea", 20.0, "Food", date(2024, 1, 20))
        .unwrap();

    assert_eq!(fs::read_to_string(&moved).unwrap(), truncated);
    assert_eq!(moved.parent(), Some(dir.as_path()));
    assert_eq!(store.load().unwrap()[0].description, "Tea");
}
