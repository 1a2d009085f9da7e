use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{Result, TransactionError};
use crate::logging::LogContext;
use crate::models::{canonicalize_address, parse_hex_u128, parse_hex_u64, Transaction, WEI_PER_COIN};
use crate::storage::Storage;

/// Normalizes raw node transactions and keeps the ones touching a subscribed address
pub struct TransactionFilter {
    storage: Arc<dyn Storage>,
}

impl TransactionFilter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate and normalize `raw`, then store it if sender or receiver is subscribed.
    ///
    /// Returns `Ok(None)` for a well-formed but irrelevant transaction. A malformed record
    /// fails with [`TransactionError`] and leaves the store untouched.
    pub fn process(&self, raw: &Value, block_timestamp: u64) -> Result<Option<Transaction>> {
        let transaction = parse_transaction(raw, block_timestamp)?;

        let sender_subscribed = self.storage.is_subscribed(&transaction.from_address)?;
        let receiver_subscribed = match &transaction.to_address {
            Some(to) => self.storage.is_subscribed(to)?,
            None => false,
        };

        if !sender_subscribed && !receiver_subscribed {
            return Ok(None);
        }

        // Only subscribed sides get a history entry
        let mut owners = Vec::with_capacity(2);
        if sender_subscribed {
            owners.push(transaction.from_address.as_str());
        }
        if let (true, Some(to)) = (receiver_subscribed, transaction.to_address.as_deref()) {
            owners.push(to);
        }
        self.storage.store_transaction(&transaction, &owners)?;

        LogContext::new("transaction_filter", "process")
            .with_transaction_hash(&transaction.hash)
            .with_block_number(transaction.block_number)
            .with_metadata("sender_subscribed", serde_json::json!(sender_subscribed))
            .with_metadata("receiver_subscribed", serde_json::json!(receiver_subscribed))
            .debug("Stored relevant transaction");

        Ok(Some(transaction))
    }
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> std::result::Result<&'a str, TransactionError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(TransactionError::MissingField { field })
}

/// Field-level normalization without touching the store
pub fn parse_transaction(raw: &Value, block_timestamp: u64) -> std::result::Result<Transaction, TransactionError> {
    let object = raw.as_object().ok_or(TransactionError::NotAnObject)?;

    let from = required_str(object, "from")?;
    let value = required_str(object, "value")?;
    let hash = required_str(object, "hash")?;
    let block_number = required_str(object, "blockNumber")?;

    // Anything but a non-empty string means contract creation
    let to_address = object
        .get("to")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(canonicalize_address);

    // Values are capped at u128::MAX wei; anything wider is rejected as malformed
    let wei = parse_hex_u128(value).map_err(|reason| TransactionError::InvalidHex {
        field: "value",
        value: value.to_string(),
        reason,
    })?;

    let block_number = parse_hex_u64(block_number).map_err(|reason| TransactionError::InvalidHex {
        field: "blockNumber",
        value: block_number.to_string(),
        reason,
    })?;

    Ok(Transaction {
        hash: hash.to_string(),
        from_address: canonicalize_address(from),
        to_address,
        value: wei as f64 / WEI_PER_COIN,
        value_wei: wei.to_string(),
        block_number,
        timestamp: block_timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParserError;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    const SUBSCRIBED: &str = "0x91a9cef0099df1d2ea4f4b825ac06b506dfdbe07";
    const OTHER: &str = "0xdef0000000000000000000000000000000000001";

    fn filter_with_subscriber() -> (TransactionFilter, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.add_subscriber(SUBSCRIBED).unwrap();
        (TransactionFilter::new(storage.clone()), storage)
    }

    #[test]
    fn test_relevant_sender_is_stored() {
        let (filter, storage) = filter_with_subscriber();

        let raw = json!({
            "hash": "0x1",
            "from": SUBSCRIBED,
            "to": OTHER,
            "value": "0x1",
            "blockNumber": "0x1"
        });

        let tx = filter.process(&raw, 1000).unwrap().expect("Expected a relevant transaction");
        assert!((tx.value - 1e-18).abs() < f64::EPSILON);
        assert_eq!(tx.value_wei, "1");
        assert_eq!(tx.block_number, 1);
        assert_eq!(tx.timestamp, 1000);

        assert_eq!(storage.get_transactions(SUBSCRIBED).unwrap(), vec![tx]);
        assert!(storage.get_transactions(OTHER).unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribed_sender_history_untouched() {
        let (filter, storage) = filter_with_subscriber();

        let raw = json!({
            "hash": "0x6",
            "from": OTHER,
            "to": SUBSCRIBED,
            "value": "0x1",
            "blockNumber": "0x1"
        });

        filter.process(&raw, 1000).unwrap().expect("Expected a relevant transaction");
        assert_eq!(storage.get_transactions(SUBSCRIBED).unwrap().len(), 1);
        assert!(storage.get_transactions(OTHER).unwrap().is_empty());
    }

    #[test]
    fn test_both_sides_subscribed() {
        let (filter, storage) = filter_with_subscriber();
        storage.add_subscriber(OTHER).unwrap();

        let raw = json!({
            "hash": "0x7",
            "from": OTHER,
            "to": SUBSCRIBED,
            "value": "0x1",
            "blockNumber": "0x1"
        });

        let tx = filter.process(&raw, 1000).unwrap().expect("Expected a relevant transaction");
        assert_eq!(storage.get_transactions(SUBSCRIBED).unwrap(), vec![tx.clone()]);
        assert_eq!(storage.get_transactions(OTHER).unwrap(), vec![tx]);
    }

    #[test]
    fn test_relevant_receiver_with_mixed_case() {
        let (filter, storage) = filter_with_subscriber();

        let raw = json!({
            "hash": "0x2",
            "from": OTHER,
            "to": "0x91A9CeF0099DF1D2eA4F4B825ac06B506dfDbe07",
            "value": "0xde0b6b3a7640000",
            "blockNumber": "0x10"
        });

        let tx = filter.process(&raw, 5).unwrap().expect("Expected a relevant transaction");
        assert_eq!(tx.to_address.as_deref(), Some(SUBSCRIBED));
        assert_eq!(tx.value, 1.0);
        assert_eq!(tx.block_number, 16);
        assert_eq!(storage.get_transactions(SUBSCRIBED).unwrap().len(), 1);
    }

    #[test]
    fn test_irrelevant_transaction_leaves_store_untouched() {
        let (filter, storage) = filter_with_subscriber();

        let raw = json!({
            "hash": "0x3",
            "from": OTHER,
            "to": "0xabc0000000000000000000000000000000000002",
            "value": "0x0",
            "blockNumber": "0x1"
        });

        assert!(filter.process(&raw, 1000).unwrap().is_none());
        assert!(storage.get_transactions(OTHER).unwrap().is_empty());
        assert!(storage.get_transactions(SUBSCRIBED).unwrap().is_empty());
    }

    #[test]
    fn test_contract_creation() {
        let (filter, storage) = filter_with_subscriber();

        for to in [json!(null), json!(""), json!(42)] {
            let raw = json!({
                "hash": "0x4",
                "from": SUBSCRIBED,
                "to": to,
                "value": "0x0",
                "blockNumber": "0x1"
            });
            let tx = filter.process(&raw, 1).unwrap().expect("Expected a relevant transaction");
            assert!(tx.is_contract_creation());
        }

        let raw = json!({"hash": "0x5", "from": SUBSCRIBED, "value": "0x0", "blockNumber": "0x1"});
        assert!(filter.process(&raw, 1).unwrap().unwrap().is_contract_creation());

        assert_eq!(storage.get_transactions(SUBSCRIBED).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_hash_is_malformed_without_mutation() {
        let (filter, storage) = filter_with_subscriber();

        let raw = json!({"from": SUBSCRIBED, "to": OTHER, "value": "0x1", "blockNumber": "0x1"});

        let error = filter.process(&raw, 1000).unwrap_err();
        assert!(matches!(
            error,
            ParserError::MalformedTransaction(TransactionError::MissingField { field: "hash" })
        ));
        assert!(storage.get_transactions(SUBSCRIBED).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_fields() {
        let base = json!({"hash": "0x1", "from": SUBSCRIBED, "value": "0x1", "blockNumber": "0x1"});

        for field in ["from", "value", "hash", "blockNumber"] {
            let mut empty = base.clone();
            empty[field] = json!("");
            assert!(matches!(
                parse_transaction(&empty, 0),
                Err(TransactionError::MissingField { field: f }) if f == field
            ));

            let mut wrong_type = base.clone();
            wrong_type[field] = json!(1);
            assert!(parse_transaction(&wrong_type, 0).is_err());
        }

        let mut bad_value = base.clone();
        bad_value["value"] = json!("0xnothex");
        assert!(matches!(
            parse_transaction(&bad_value, 0),
            Err(TransactionError::InvalidHex { field: "value", .. })
        ));

        let mut bad_block = base.clone();
        bad_block["blockNumber"] = json!("0x");
        assert!(matches!(
            parse_transaction(&bad_block, 0),
            Err(TransactionError::InvalidHex { field: "blockNumber", .. })
        ));

        assert!(matches!(parse_transaction(&json!("0x1"), 0), Err(TransactionError::NotAnObject)));
    }

    #[test]
    fn test_large_value_keeps_exact_wei() {
        // 2^100 wei, beyond u64
        let raw = json!({
            "hash": "0x1",
            "from": SUBSCRIBED,
            "value": "0x10000000000000000000000000",
            "blockNumber": "0x1"
        });

        let tx = parse_transaction(&raw, 0).unwrap();
        assert_eq!(tx.value_wei, "1267650600228229401496703205376");
        assert!((tx.value - 1_267_650_600_228.229_4).abs() < 1.0);
    }

    #[test]
    fn test_value_wider_than_u128_is_malformed() {
        let (filter, storage) = filter_with_subscriber();
        let max = json!({
            "hash": "0x1",
            "from": SUBSCRIBED,
            "value": format!("0x{}", "f".repeat(32)),
            "blockNumber": "0x1"
        });
        assert_eq!(parse_transaction(&max, 0).unwrap().value_wei, u128::MAX.to_string());

        let mut wide = max.clone();
        wide["value"] = json!(format!("0x1{}", "0".repeat(32)));
        assert!(matches!(
            parse_transaction(&wide, 0),
            Err(TransactionError::InvalidHex { field: "value", .. })
        ));
        assert!(filter.process(&wide, 0).is_err());
        assert!(storage.get_transactions(SUBSCRIBED).unwrap().is_empty());
    }
}
