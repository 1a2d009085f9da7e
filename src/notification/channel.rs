use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::notification::{Notification, NotificationError, Notifier};

/// Forwards events to an in-process consumer
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving half of its bounded channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    fn name(&self) -> &str {
        "channel"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sender
            .send(notification.clone())
            .await
            .map_err(|e| NotificationError::ChannelClosed(e.to_string()))
    }
}
