use async_trait::async_trait;
use log::info;

use crate::notification::{Notification, NotificationError, Notifier};

/// Prints a banner per event to stdout
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }

    pub fn render(notification: &Notification) -> String {
        let tx = &notification.transaction;
        let to = tx.to_address.as_deref().unwrap_or("(contract creation)");

        format!(
            "\n=== {} Transaction Notification ===\n\
             Address: {}\n\
             Transaction Hash: {}\n\
             From: {}\n\
             To: {}\n\
             Value: {:.18} ETH\n\
             Block Number: {}\n\
             ================================\n",
            notification.kind.direction(),
            notification.address,
            tx.hash,
            tx.from_address,
            to,
            tx.value,
            tx.block_number
        )
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        println!("{}", Self::render(notification));
        info!(
            "Notification sent for {} transaction to address {}",
            notification.kind.direction(),
            notification.address
        );
        Ok(())
    }
}
