#![doc(test(attr(deny(warnings))))]

//! Expense Ledger records income and expense entries, keeps a running
//! balance, filters by month of the current year and exports to CSV.

pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Ledger tracing initialized.");
    });
}
