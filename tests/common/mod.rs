#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use expense_ledger::{
    ledger::{FixedClock, Ledger},
    storage::{JsonStore, MemoryStore},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A unique directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Ledger over a shared in-memory store, with the clock frozen at `today`.
pub fn memory_ledger(today: NaiveDate) -> (Ledger, MemoryStore) {
    let store = MemoryStore::new();
    let ledger = Ledger::open_with_clock(Box::new(store.clone()), Box::new(FixedClock::new(today)))
        .expect("open in-memory ledger");
    (ledger, store)
}

/// Ledger over a JSON store in a fresh directory.
pub fn json_ledger(today: NaiveDate) -> (Ledger, JsonStore) {
    let store = JsonStore::new(temp_dir()).expect("create json store");
    let ledger = Ledger::open_with_clock(Box::new(store.clone()), Box::new(FixedClock::new(today)))
        .expect("open json ledger");
    (ledger, store)
}
