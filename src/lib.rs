pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notification;
pub mod retry;
pub mod storage;

pub use blockchain::{BlockMonitor, BlockMonitorConfig, Parser, RpcClient, TickOutcome, TransactionFilter};
pub use config::{AppConfig, ApiConfig, LoggingConfig, MonitorConfig, NetworkSettings, RpcConfig, StorageBackend};
pub use error::{ParserError, Result, RpcError};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{Block, Transaction};
pub use notification::{Notification, NotificationKind, NotificationService, Notifier};
pub use retry::{RetryConfig, RetryManager};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
