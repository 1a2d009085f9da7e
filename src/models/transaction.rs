use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Smallest units per coin (wei per ether)
pub const WEI_PER_COIN: f64 = 1e18;

/// A relevant transaction as retained by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from_address: String,
    /// `None` for contract creation
    pub to_address: Option<String>,
    /// Value in coin units, for display
    pub value: f64,
    /// Exact value in smallest units as a decimal string
    pub value_wei: String,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to_address.is_none()
    }
}

/// Block body as returned by `eth_getBlockByNumber` with full transaction objects.
///
/// Fields the monitor depends on are optional so that a partial answer from the node
/// surfaces as a descriptive error instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub number: Option<String>,
    pub hash: Option<String>,
    pub timestamp: Option<String>,
    pub transactions: Option<Vec<Value>>,
}
