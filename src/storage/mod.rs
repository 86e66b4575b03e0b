pub mod json_backend;
pub mod memory;

use crate::{errors::PersistenceError, ledger::Transaction};

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Key under which the transaction list is persisted.
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Abstraction over the key-value store holding the serialized transaction list.
pub trait TransactionStore: Send + Sync {
    /// Reads the persisted sequence. An absent key reads back as empty.
    fn load(&self) -> Result<Vec<Transaction>>;
    /// Replaces the persisted sequence.
    fn save(&self, transactions: &[Transaction]) -> Result<()>;
    /// Removes the key entirely rather than writing an empty list.
    fn clear(&self) -> Result<()>;
    /// Whether the key currently exists.
    fn contains(&self) -> Result<bool>;
}

pub use json_backend::JsonStore;
pub use memory::MemoryStore;
