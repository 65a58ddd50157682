//! Notification ledger — the persisted set of members already welcomed.
//!
//! The ledger is the single source of truth for idempotent delivery: a member
//! is only messaged while absent from it, and only recorded after a confirmed
//! send. Storage is injected through [`LedgerStore`] so the same ledger runs
//! against the JSON file in production and an in-memory fake in tests.

pub mod file_store;
pub mod memory_store;

mod ledger;

use subbot_common::error::AppError;
use subbot_common::types::MemberId;

pub use file_store::JsonFileStore;
pub use ledger::NotificationLedger;
pub use memory_store::MemoryStore;

/// Backing storage for the ledger.
///
/// Implementations persist the whole member list on every `save`; the ledger
/// is small enough that incremental writes are not worth the complexity.
pub trait LedgerStore: Send + Sync {
    /// Read the persisted member list. A store that has never been written
    /// returns an empty list rather than an error.
    fn load(&self) -> Result<Vec<MemberId>, AppError>;

    /// Replace the persisted member list with `members`.
    fn save(&self, members: &[MemberId]) -> Result<(), AppError>;

    /// Human-readable location for log output.
    fn describe(&self) -> String;
}
