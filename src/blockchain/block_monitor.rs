use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::blockchain::{Parser, RpcClient};
use crate::error::{ParserError, RpcError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{parse_hex_u64, Transaction};
use crate::notification::{Notification, NotificationKind, NotificationService};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Store error: {0}")]
    Store(#[from] ParserError),

    #[error("Block {block_number} is not available yet")]
    BlockUnavailable { block_number: u64 },

    #[error("Block {block_number} is unusable: {reason}")]
    InvalidBlock { block_number: u64, reason: String },
}

#[derive(Debug, Clone)]
pub struct BlockMonitorConfig {
    pub poll_interval: Duration,
}

impl Default for BlockMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// What one poll did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoNewBlock { latest: u64, cursor: u64 },
    Processed(BlockSummary),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockSummary {
    pub block_number: u64,
    pub transaction_count: usize,
    pub relevant_count: usize,
    /// Malformed records that were skipped
    pub skipped_count: usize,
    pub notifications_failed: usize,
    /// Heights between the previous cursor and this block that were never fetched
    pub blocks_skipped: u64,
}

/// Polls the node for new blocks and feeds their transactions through the parser
pub struct BlockMonitor {
    rpc_client: Arc<RpcClient>,
    parser: Arc<Parser>,
    notifier: NotificationService,
    pub config: BlockMonitorConfig,
    pub shutdown_signal: Arc<AtomicBool>,
}

impl BlockMonitor {
    pub fn new(
        rpc_client: Arc<RpcClient>,
        parser: Arc<Parser>,
        notifier: NotificationService,
        config: Option<BlockMonitorConfig>,
    ) -> Self {
        Self {
            rpc_client,
            parser,
            notifier,
            config: config.unwrap_or_default(),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Poll until [`BlockMonitor::shutdown`] is called. Tick failures are logged and the
    /// loop carries on; the next tick retries.
    pub async fn start(&self) -> Result<(), MonitorError> {
        info!(
            "Starting block monitor with {}ms polling interval",
            self.config.poll_interval.as_millis()
        );

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.is_shutdown() {
                break;
            }

            ticker.tick().await;

            if self.is_shutdown() {
                break;
            }

            if let Err(e) = self.tick().await {
                LogContext::new("block_monitor", "tick")
                    .with_metadata("error", serde_json::json!(e.to_string()))
                    .warn(&format!("Tick failed: {}", e));
            }
        }

        info!("Shutdown signal received, stopping block monitor");
        Ok(())
    }

    /// One poll: compare the node's latest height with the cursor and process the latest block
    pub async fn tick(&self) -> Result<TickOutcome, MonitorError> {
        let latest = self.rpc_client.get_latest_block_number().await?;
        let cursor = self.parser.get_current_block()?;

        if latest <= cursor {
            MetricsLogger::log_tick_status(latest, cursor, self.parser.get_subscribers()?.len());
            return Ok(TickOutcome::NoNewBlock { latest, cursor });
        }

        // Only the latest height is fetched; anything in between is never revisited
        let blocks_skipped = if cursor > 0 { latest - cursor - 1 } else { 0 };
        if blocks_skipped > 0 {
            LogContext::new("block_monitor", "gap")
                .with_metadata("cursor", serde_json::json!(cursor))
                .with_metadata("latest", serde_json::json!(latest))
                .with_metadata("blocks_skipped", serde_json::json!(blocks_skipped))
                .warn(&format!(
                    "Skipping {} blocks between {} and {}",
                    blocks_skipped, cursor, latest
                ));
        }

        info!("Processing new block: {} (current: {})", latest, cursor);

        sleep(self.rpc_client.rate_limit_delay()).await;

        let mut summary = self.process_block(latest).await?;
        summary.blocks_skipped = blocks_skipped;

        Ok(TickOutcome::Processed(summary))
    }

    async fn process_block(&self, block_number: u64) -> Result<BlockSummary, MonitorError> {
        let monitor = PerformanceMonitor::new("process_block").with_metadata("block_number", serde_json::json!(block_number));

        let block = self
            .rpc_client
            .get_block(block_number)
            .await?
            .ok_or(MonitorError::BlockUnavailable { block_number })?;

        let transactions = block.transactions.ok_or_else(|| MonitorError::InvalidBlock {
            block_number,
            reason: "missing transactions".to_string(),
        })?;

        let timestamp_hex = block.timestamp.ok_or_else(|| MonitorError::InvalidBlock {
            block_number,
            reason: "missing timestamp".to_string(),
        })?;

        let timestamp = parse_hex_u64(&timestamp_hex).map_err(|e| MonitorError::InvalidBlock {
            block_number,
            reason: format!("invalid timestamp '{}': {}", timestamp_hex, e),
        })?;

        debug!("Processing {} transactions from block {}", transactions.len(), block_number);

        let mut summary = BlockSummary {
            block_number,
            transaction_count: transactions.len(),
            ..BlockSummary::default()
        };

        for (index, raw) in transactions.iter().enumerate() {
            match self.parser.process_transaction(raw, timestamp) {
                Ok(Some(transaction)) => {
                    summary.relevant_count += 1;
                    summary.notifications_failed += self.notify_transaction(&transaction).await;
                }
                Ok(None) => {}
                Err(e) => {
                    summary.skipped_count += 1;
                    let context = LogContext::new("block_monitor", "process_transaction")
                        .with_block_number(block_number)
                        .with_metadata("index", serde_json::json!(index));
                    ErrorLogger::log_error(&e, Some(context));
                }
            }
        }

        self.parser.update_current_block(block_number)?;

        let duration = monitor.finish_with_result::<(), String>(&Ok(()));
        MetricsLogger::log_block_processed(block_number, summary.transaction_count, summary.relevant_count, duration);

        Ok(summary)
    }

    /// One event per subscribed side. Returns the number of failed deliveries.
    async fn notify_transaction(&self, transaction: &Transaction) -> usize {
        let mut notifications = Vec::new();

        if let Some(to) = &transaction.to_address {
            if self.side_is_subscribed(to) {
                notifications.push(Notification::new(NotificationKind::Received, to, transaction.clone()));
            }
        }
        if self.side_is_subscribed(&transaction.from_address) {
            notifications.push(Notification::new(
                NotificationKind::Sent,
                &transaction.from_address,
                transaction.clone(),
            ));
        }

        let mut failed = 0;
        for notification in &notifications {
            info!(
                "{} transaction detected for {}",
                notification.kind.direction(),
                notification.address
            );

            if let Err(e) = self.notifier.notify(notification).await {
                failed += 1;
                LogContext::new("block_monitor", "notify")
                    .with_transaction_hash(&transaction.hash)
                    .with_address(&notification.address)
                    .error(&format!("Notification delivery failed: {}", e));
            }
        }

        failed
    }

    fn side_is_subscribed(&self, address: &str) -> bool {
        match self.parser.is_subscribed(address) {
            Ok(subscribed) => subscribed,
            Err(e) => {
                error!("Failed to check subscription for {}: {}", address, e);
                false
            }
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown_signal.load(Ordering::Relaxed)
    }

    /// Request graceful shutdown
    pub fn shutdown(&self) {
        info!("Requesting graceful shutdown");
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }
}
