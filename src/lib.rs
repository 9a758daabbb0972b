pub mod amount;
pub mod atm;
pub mod config;
pub mod console;
pub mod ledger;
pub mod model;
pub mod store;

pub use amount::Amount;
pub use atm::Atm;
pub use model::{NoteBreakdown, Pin, TransactionKind, TransactionRecord, TransferRequest};
