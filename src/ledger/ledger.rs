use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::{
    errors::{LedgerResult, PersistenceError, ValidationError},
    export,
    storage::TransactionStore,
};

use super::{
    clock::{Clock, SystemClock},
    filter::MonthFilter,
    summary::Summary,
    transaction::{
        check_date_format, validate_fields, Transaction, TransactionId, TransactionKind,
        DEFAULT_DISPLAY_FORMAT,
    },
};

/// Maximum number of rows returned by [`Ledger::visible`].
pub const VISIBLE_LIMIT: usize = 100;

/// The transaction collection, its active month filter and the store it writes through to.
///
/// Transactions are held most-recently-added first. Every mutation is persisted
/// immediately; if the write fails the in-memory change is kept and the
/// failure is returned to the caller.
pub struct Ledger {
    transactions: Vec<Transaction>,
    filter: MonthFilter,
    date_format: String,
    store: Box<dyn TransactionStore>,
    clock: Box<dyn Clock>,
}

impl Ledger {
    /// Restores the ledger from `store` using the system clock.
    pub fn open(store: Box<dyn TransactionStore>) -> Result<Self, PersistenceError> {
        Self::open_with_clock(store, Box::new(SystemClock))
    }

    pub fn open_with_clock(
        store: Box<dyn TransactionStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, PersistenceError> {
        let records = store.load()?;
        let transactions = restore(records);
        tracing::debug!(count = transactions.len(), "ledger restored");
        Ok(Self {
            transactions,
            filter: MonthFilter::All,
            date_format: DEFAULT_DISPLAY_FORMAT.into(),
            store,
            clock,
        })
    }

    /// Starts an empty session without reading the store. Used when the stored
    /// data cannot be read.
    pub fn empty(store: Box<dyn TransactionStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            transactions: Vec::new(),
            filter: MonthFilter::All,
            date_format: DEFAULT_DISPLAY_FORMAT.into(),
            store,
            clock,
        }
    }

    pub fn add(
        &mut self,
        kind: TransactionKind,
        description: &str,
        amount: f64,
        category: &str,
        date: NaiveDate,
    ) -> LedgerResult<Transaction> {
        validate_fields(description, amount, category)?;

        let transaction = Transaction {
            id: self.next_id(),
            kind,
            description: description.trim().to_string(),
            amount,
            category: category.trim().to_string(),
            date,
        };
        self.transactions.insert(0, transaction.clone());
        tracing::debug!(id = %transaction.id, kind = %kind, amount, "transaction added");

        self.persist()?;
        Ok(transaction)
    }

    /// Removes the transaction with `id`. Unknown ids are not an error.
    pub fn delete(&mut self, id: TransactionId) -> Result<Option<Transaction>, PersistenceError> {
        let removed = self
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .map(|index| self.transactions.remove(index));
        match &removed {
            Some(_) => tracing::debug!(%id, "transaction deleted"),
            None => tracing::debug!(%id, "delete ignored, no such transaction"),
        }
        self.persist()?;
        Ok(removed)
    }

    /// Empties the ledger and removes the persisted key.
    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        let count = self.transactions.len();
        self.transactions.clear();
        tracing::info!(count, "ledger cleared");
        self.store.clear().map_err(|err| {
            tracing::warn!(error = %err, "failed to remove persisted transactions");
            err
        })
    }

    /// Sets the month filter by zero-based index, or clears it with `None`.
    pub fn set_filter(&mut self, month: Option<u32>) -> Result<(), ValidationError> {
        self.filter = match month {
            Some(index) => MonthFilter::from_index(index)?,
            None => MonthFilter::All,
        };
        Ok(())
    }

    pub fn filter_current_month(&mut self) {
        self.filter = MonthFilter::current(self.today());
    }

    pub fn filter(&self) -> MonthFilter {
        self.filter
    }

    /// Filtered entries, most recent first, capped at [`VISIBLE_LIMIT`] after filtering.
    pub fn visible(&self) -> Vec<&Transaction> {
        let today = self.today();
        self.transactions
            .iter()
            .filter(|txn| self.filter.matches(txn, today))
            .take(VISIBLE_LIMIT)
            .collect()
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(&self.transactions, self.filter, self.today())
    }

    /// CSV of every transaction, ignoring the filter and the listing cap.
    pub fn export(&self) -> String {
        export::to_csv(&self.transactions, &self.date_format)
    }

    /// Format used for dates in listings and exports.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn set_date_format(&mut self, format: &str) -> Result<(), ValidationError> {
        check_date_format(format)?;
        self.date_format = format.to_string();
        Ok(())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Whether the store currently holds a persisted transaction list.
    pub fn is_persisted(&self) -> Result<bool, PersistenceError> {
        self.store.contains()
    }

    fn next_id(&self) -> TransactionId {
        let now = self.clock.timestamp_millis();
        match self.transactions.iter().map(|txn| txn.id.0).max() {
            Some(latest) if latest >= now => TransactionId(latest + 1),
            _ => TransactionId(now),
        }
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        self.store.save(&self.transactions).map_err(|err| {
            tracing::warn!(error = %err, "failed to persist transactions");
            err
        })
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("transactions", &self.transactions.len())
            .field("filter", &self.filter)
            .field("date_format", &self.date_format)
            .finish()
    }
}

/// Drops stored records that break the ledger invariants.
fn restore(records: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|txn| {
            if let Err(err) = validate_fields(&txn.description, txn.amount, &txn.category) {
                tracing::warn!(id = %txn.id, error = %err, "dropping invalid stored transaction");
                return false;
            }
            if !seen.insert(txn.id) {
                tracing::warn!(id = %txn.id, "dropping duplicate stored transaction");
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::LedgerError,
        ledger::clock::FixedClock,
        storage::{MemoryStore, Result as StoreResult},
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn ledger_on(today: NaiveDate) -> (Ledger, MemoryStore) {
        let store = MemoryStore::new();
        let ledger =
            Ledger::open_with_clock(Box::new(store.clone()), Box::new(FixedClock::new(today)))
                .expect("open ledger");
        (ledger, store)
    }

    struct FailingStore;

    impl TransactionStore for FailingStore {
        fn load(&self) -> StoreResult<Vec<Transaction>> {
            Ok(Vec::new())
        }
        fn save(&self, _: &[Transaction]) -> StoreResult<()> {
            Err(PersistenceError::Unavailable("quota exceeded".into()))
        }
        fn clear(&self) -> StoreResult<()> {
            Err(PersistenceError::Unavailable("quota exceeded".into()))
        }
        fn contains(&self) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn ids_stay_unique_within_one_tick() {
        let (mut ledger, _) = ledger_on(date(2024, 1, 10));
        let first = ledger
            .add(TransactionKind::Expense, "Tea", 20.0, "Food", date(2024, 1, 10))
            .unwrap();
        let second = ledger
            .add(TransactionKind::Expense, "Snack", 30.0, "Food", date(2024, 1, 10))
            .unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
    }

    #[test]
    fn add_trims_text_fields() {
        let (mut ledger, _) = ledger_on(date(2024, 1, 10));
        let txn = ledger
            .add(TransactionKind::Income, "  Bonus ", 10.0, " Salary ", date(2024, 1, 10))
            .unwrap();
        assert_eq!(txn.description, "Bonus");
        assert_eq!(txn.category, "Salary");
    }

    #[test]
    fn filter_is_applied_before_the_cap() {
        let (mut ledger, _) = ledger_on(date(2024, 6, 1));
        for n in 0..120 {
            ledger
                .add(TransactionKind::Expense, "Old", 1.0, "Other", date(2024, 1, 15))
                .unwrap();
            if n < 5 {
                ledger
                    .add(TransactionKind::Expense, "June", 1.0, "Other", date(2024, 6, 1))
                    .unwrap();
            }
        }
        assert_eq!(ledger.visible().len(), VISIBLE_LIMIT);

        ledger.set_filter(Some(0)).unwrap();
        let january = ledger.visible();
        assert_eq!(january.len(), VISIBLE_LIMIT);
        assert!(january.iter().all(|txn| txn.description == "Old"));

        ledger.filter_current_month();
        assert_eq!(ledger.visible().len(), 5);
    }

    #[test]
    fn invalid_month_leaves_filter_untouched() {
        let (mut ledger, _) = ledger_on(date(2024, 6, 1));
        ledger.set_filter(Some(3)).unwrap();
        let err = ledger.set_filter(Some(12)).expect_err("month 12 is invalid");
        assert_eq!(err, ValidationError::InvalidMonth(12));
        assert_eq!(ledger.filter().index(), Some(3));
    }

    #[test]
    fn persistence_failure_keeps_memory_state() {
        let mut ledger = Ledger::open_with_clock(
            Box::new(FailingStore),
            Box::new(FixedClock::new(date(2024, 1, 1))),
        )
        .unwrap();
        let err = ledger
            .add(TransactionKind::Income, "Salary", 100.0, "Salary", date(2024, 1, 1))
            .expect_err("save must fail");
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.summary().total_income, 100.0);
    }

    #[test]
    fn failed_clear_still_empties_the_session() {
        let mut ledger = Ledger::open_with_clock(
            Box::new(FailingStore),
            Box::new(FixedClock::new(date(2024, 1, 1))),
        )
        .unwrap();
        let _ = ledger.add(TransactionKind::Expense, "Rent", 900.0, "Bills", date(2024, 1, 1));
        assert_eq!(ledger.len(), 1);

        let err = ledger.clear_all().expect_err("clear must fail");
        assert!(matches!(err, PersistenceError::Unavailable(_)), "{err:?}");
        assert!(ledger.is_empty());
        assert_eq!(ledger.summary().balance, 0.0);
    }

    #[test]
    fn export_follows_the_configured_date_format() {
        let (mut ledger, _) = ledger_on(date(2024, 1, 10));
        ledger
            .add(TransactionKind::Expense, "Tea", 20.0, "Food", date(2024, 1, 5))
            .unwrap();
        assert!(ledger.export().contains("\n5/1/2024,"));

        ledger.set_date_format("%Y-%m-%d").unwrap();
        assert!(ledger.export().contains("\n2024-01-05,"));

        let err = ledger.set_date_format("%Q").expect_err("unknown specifier");
        assert_eq!(err, ValidationError::InvalidDateFormat("%Q".into()));
        assert_eq!(ledger.date_format(), "%Y-%m-%d");
    }

    #[test]
    fn restore_drops_invalid_and_duplicate_records() {
        let good = Transaction {
            id: TransactionId(1),
            kind: TransactionKind::Income,
            description: "Salary".into(),
            amount: 10.0,
            category: "Salary".into(),
            date: date(2024, 1, 1),
        };
        let negative = Transaction {
            id: TransactionId(2),
            amount: -5.0,
            ..good.clone()
        };
        let store = MemoryStore::with_transactions(vec![good.clone(), negative, good.clone()]);
        let ledger = Ledger::open_with_clock(
            Box::new(store),
            Box::new(FixedClock::new(date(2024, 1, 1))),
        )
        .unwrap();
        assert_eq!(ledger.transactions(), &[good]);
    }
}
