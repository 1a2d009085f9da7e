//! Delivery of relevant-transaction events to one or more sinks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod channel;
mod console;
mod error;
mod webhook;

pub use channel::ChannelNotifier;
pub use console::ConsoleNotifier;
pub use error::NotificationError;
pub use webhook::WebhookNotifier;

use crate::logging::MetricsLogger;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// The subscribed address is the receiver
    #[serde(rename = "TRANSACTION_RECEIVED")]
    Received,
    /// The subscribed address is the sender
    #[serde(rename = "TRANSACTION_SENT")]
    Sent,
}

impl NotificationKind {
    pub fn direction(&self) -> &'static str {
        match self {
            NotificationKind::Received => "Incoming",
            NotificationKind::Sent => "Outgoing",
        }
    }
}

/// Event for one subscribed side of a relevant transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub address: String,
    pub transaction: Transaction,
    /// Block timestamp, unix seconds
    pub timestamp: u64,
}

impl Notification {
    pub fn new(kind: NotificationKind, address: &str, transaction: Transaction) -> Self {
        let timestamp = transaction.timestamp;
        Self {
            kind,
            address: address.to_string(),
            transaction,
            timestamp,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short sink name used in logs
    fn name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Fans a notification out to every registered sink
#[derive(Clone, Default)]
pub struct NotificationService {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn Notifier>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Every sink is attempted; the first failure is returned. No retry.
    pub async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut first_error = None;

        for sink in &self.sinks {
            let result = sink.notify(notification).await;
            MetricsLogger::log_notification(
                sink.name(),
                &notification.address,
                &notification.transaction.hash,
                result.is_ok(),
            );

            if let Err(error) = result {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
