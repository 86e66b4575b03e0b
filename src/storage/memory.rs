use std::sync::{Arc, Mutex, MutexGuard};

use crate::{errors::PersistenceError, ledger::Transaction};

use super::{Result, TransactionStore};

/// In-memory store. Clones share the same slot, so a caller can keep a handle
/// and inspect what the ledger persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Vec<Transaction>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(transactions))),
        }
    }

    /// Snapshot of the persisted value; `None` when the key is absent.
    pub fn snapshot(&self) -> Result<Option<Vec<Transaction>>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Vec<Transaction>>>> {
        self.slot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))
    }
}

impl TransactionStore for MemoryStore {
    fn load(&self) -> Result<Vec<Transaction>> {
        Ok(self.lock()?.clone().unwrap_or_default())
    }

    fn save(&self, transactions: &[Transaction]) -> Result<()> {
        *self.lock()? = Some(transactions.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }

    fn contains(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }
}
