use std::fmt::{self, Write};
use std::str::FromStr;

use chrono::{
    format::{Item, StrftimeItems},
    NaiveDate,
};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Default display format: day/month/year without zero padding (`en-IN` style).
pub const DEFAULT_DISPLAY_FORMAT: &str = "%-d/%-m/%Y";

/// Millisecond creation timestamp identifying a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TransactionId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Sign shown in front of amounts in listings.
    pub fn sign(&self) -> char {
        match self {
            TransactionKind::Income => '+',
            TransactionKind::Expense => '-',
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "in" | "+" => Ok(TransactionKind::Income),
            "expense" | "out" | "-" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

/// A single income or expense record.
///
/// The persisted field names (`type`, `desc`) match the layout the tracker has
/// always written, so older data files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(rename = "desc")]
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(with = "stored_date")]
    pub date: NaiveDate,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Renders the date with a chrono format string, e.g. [`DEFAULT_DISPLAY_FORMAT`].
    ///
    /// A format chrono cannot apply to a plain date falls back to ISO form.
    pub fn display_date(&self, format: &str) -> String {
        let mut out = String::new();
        if write!(out, "{}", self.date.format(format)).is_err() {
            return self.date.to_string();
        }
        out
    }
}

/// Checks the invariants every stored transaction must satisfy.
pub fn validate_fields(description: &str, amount: f64, category: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if !amount.is_finite() {
        return Err(ValidationError::NonFiniteAmount);
    }
    if amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if category.trim().is_empty() {
        return Err(ValidationError::EmptyCategory);
    }
    Ok(())
}

/// Rejects format strings chrono cannot render for a calendar date, such as
/// unknown specifiers (`%Q`) or time fields (`%H`).
pub fn check_date_format(format: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidDateFormat(format.to_string());
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut probe = String::new();
    write!(probe, "{}", NaiveDate::MIN.format(format)).map_err(|_| invalid())
}

/// Parses a user-supplied amount string.
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;
    if !amount.is_finite() {
        return Err(ValidationError::NonFiniteAmount);
    }
    Ok(amount)
}

/// Parses either an ISO date or the `d/m/yyyy` display form.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

mod stored_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}
