pub mod block_monitor;
pub mod parser;
pub mod rpc_client;
pub mod transaction_filter;

pub use block_monitor::{BlockMonitor, BlockMonitorConfig, BlockSummary, MonitorError, TickOutcome};
pub use parser::Parser;
pub use rpc_client::RpcClient;
pub use transaction_filter::{parse_transaction, TransactionFilter};
