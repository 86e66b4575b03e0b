//! Transaction ledger: storage-backed collection, month filtering and totals.

pub mod clock;
pub mod filter;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod summary;
pub mod transaction;

pub use clock::{Clock, FixedClock, SystemClock};
pub use filter::MonthFilter;
pub use ledger::{Ledger, VISIBLE_LIMIT};
pub use summary::Summary;
pub use transaction::{
    check_date_format, parse_amount, parse_date, Transaction, TransactionId, TransactionKind,
    DEFAULT_DISPLAY_FORMAT,
};
