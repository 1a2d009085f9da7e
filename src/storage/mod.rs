pub mod memory;
pub mod schema;
pub mod sqlite;


use std::collections::HashSet;

use crate::error::StorageError;
use crate::models::Transaction;

pub use memory::MemoryStorage;
pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;

/// Subscription set, address-indexed transaction history and block cursor.
///
/// Every address argument is canonicalized by the implementation, so callers may pass
/// mixed-case input. Implementations are shared between the monitor (writer) and the
/// query layer (reader) and must do their own locking.
pub trait Storage: Send + Sync {
    /// Add an address to the watch set. Returns `false` without mutating anything when the
    /// address does not have the `0x` + 40 character shape; re-adding is a no-op returning `true`.
    fn add_subscriber(&self, address: &str) -> Result<bool, StorageError>;

    fn is_subscribed(&self, address: &str) -> Result<bool, StorageError>;

    /// Snapshot of the watch set
    fn list_subscribers(&self) -> Result<HashSet<String>, StorageError>;

    /// Append to the history of each address in `owners`, in order. The caller decides which
    /// sides are subscribed; nothing is written under any other address. Duplicate hashes are
    /// not collapsed.
    fn store_transaction(&self, transaction: &Transaction, owners: &[&str]) -> Result<(), StorageError>;

    /// History for an address in insertion order; empty for unknown addresses
    fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StorageError>;

    fn update_block_cursor(&self, height: u64) -> Result<(), StorageError>;

    fn get_block_cursor(&self) -> Result<u64, StorageError>;
}
