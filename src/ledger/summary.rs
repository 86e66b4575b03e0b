use chrono::NaiveDate;
use serde::Serialize;

use super::{filter::MonthFilter, transaction::Transaction};

/// Aggregate totals shown alongside the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    /// Expenses inside the active month filter; equals `total_expenses` when unfiltered.
    pub period_expenses: f64,
}

impl Summary {
    /// Income and expense totals ignore the filter; only `period_expenses` honours it.
    pub fn compute<'a, I>(transactions: I, filter: MonthFilter, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;
        let mut period_expenses = 0.0;

        for txn in transactions {
            if txn.is_income() {
                total_income += txn.amount;
            } else {
                total_expenses += txn.amount;
                if filter.is_active() && filter.matches(txn, today) {
                    period_expenses += txn.amount;
                }
            }
        }

        if !filter.is_active() {
            period_expenses = total_expenses;
        }

        Self {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            period_expenses,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.balance < 0.0
    }
}
