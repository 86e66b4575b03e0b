use std::fmt;

use chrono::{Datelike, Month, NaiveDate};

use crate::errors::ValidationError;

use super::transaction::Transaction;

/// Month restriction applied to listings and period totals.
///
/// A month filter always refers to the year of the reference date passed to
/// [`MonthFilter::matches`]; there is no way to select another year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(Month),
}

impl MonthFilter {
    /// Builds a filter from a zero-based month index (0 = January).
    pub fn from_index(index: u32) -> Result<Self, ValidationError> {
        u8::try_from(index)
            .ok()
            .and_then(|index| Month::try_from(index.checked_add(1)?).ok())
            .map(MonthFilter::Month)
            .ok_or(ValidationError::InvalidMonth(index))
    }

    pub fn current(today: NaiveDate) -> Self {
        // month0 is always 0..=11
        Self::from_index(today.month0()).unwrap_or_default()
    }

    /// Zero-based index of the selected month, if any.
    pub fn index(&self) -> Option<u32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(month) => Some(month.number_from_month() - 1),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MonthFilter::Month(_))
    }

    pub fn matches(&self, transaction: &Transaction, today: NaiveDate) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(month) => {
                transaction.date.month() == month.number_from_month()
                    && transaction.date.year() == today.year()
            }
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all transactions"),
            MonthFilter::Month(month) => f.write_str(month.name()),
        }
    }
}
