use serde_json::Value;
use std::sync::Arc;

use crate::blockchain::transaction_filter::TransactionFilter;
use crate::error::Result;
use crate::logging::LogContext;
use crate::models::Transaction;
use crate::storage::Storage;

/// Collaborator surface over the store and the transaction filter.
///
/// The query layer and the block monitor both go through this type; neither touches
/// the filter directly.
pub struct Parser {
    storage: Arc<dyn Storage>,
    filter: TransactionFilter,
}

impl Parser {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let filter = TransactionFilter::new(storage.clone());
        Self { storage, filter }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Highest fully processed block height
    pub fn get_current_block(&self) -> Result<u64> {
        Ok(self.storage.get_block_cursor()?)
    }

    pub fn update_current_block(&self, block_number: u64) -> Result<()> {
        Ok(self.storage.update_block_cursor(block_number)?)
    }

    /// `false` when the address does not have the expected shape
    pub fn subscribe(&self, address: &str) -> Result<bool> {
        let accepted = self.storage.add_subscriber(address)?;

        let context = LogContext::new("parser", "subscribe").with_address(address);
        if accepted {
            context.info("Address subscribed");
        } else {
            context.debug("Rejected subscription for malformed address");
        }

        Ok(accepted)
    }

    pub fn is_subscribed(&self, address: &str) -> Result<bool> {
        Ok(self.storage.is_subscribed(address)?)
    }

    /// Watched addresses, sorted
    pub fn get_subscribers(&self) -> Result<Vec<String>> {
        let mut subscribers: Vec<String> = self.storage.list_subscribers()?.into_iter().collect();
        subscribers.sort();
        Ok(subscribers)
    }

    pub fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        Ok(self.storage.get_transactions(address)?)
    }

    pub fn process_transaction(&self, raw: &Value, block_timestamp: u64) -> Result<Option<Transaction>> {
        self.filter.process(raw, block_timestamp)
    }
}
