use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::StorageError;
use crate::models::{canonicalize_address, has_address_shape, Transaction};
use crate::storage::Storage;

#[derive(Default)]
struct MemoryState {
    subscribers: HashSet<String>,
    transactions: HashMap<String, Vec<Transaction>>,
    block_cursor: u64,
}

/// Process-local store; the default backend
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>, StorageError> {
        self.state
            .read()
            .map_err(|_| StorageError::Lock("memory store read lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>, StorageError> {
        self.state
            .write()
            .map_err(|_| StorageError::Lock("memory store write lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn add_subscriber(&self, address: &str) -> Result<bool, StorageError> {
        if !has_address_shape(address) {
            return Ok(false);
        }

        self.write()?.subscribers.insert(canonicalize_address(address));
        Ok(true)
    }

    fn is_subscribed(&self, address: &str) -> Result<bool, StorageError> {
        Ok(self.read()?.subscribers.contains(&canonicalize_address(address)))
    }

    fn list_subscribers(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self.read()?.subscribers.clone())
    }

    fn store_transaction(&self, transaction: &Transaction, owners: &[&str]) -> Result<(), StorageError> {
        let mut state = self.write()?;

        for owner in owners {
            state
                .transactions
                .entry(canonicalize_address(owner))
                .or_default()
                .push(transaction.clone());
        }

        Ok(())
    }

    fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StorageError> {
        Ok(self
            .read()?
            .transactions
            .get(&canonicalize_address(address))
            .cloned()
            .unwrap_or_default())
    }

    fn update_block_cursor(&self, height: u64) -> Result<(), StorageError> {
        self.write()?.block_cursor = height;
        Ok(())
    }

    fn get_block_cursor(&self) -> Result<u64, StorageError> {
        Ok(self.read()?.block_cursor)
    }
}
