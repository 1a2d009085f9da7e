use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::notification::{Notification, NotificationError, Notifier};

/// POSTs each event as JSON to a fixed URL
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotificationError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self.client.post(&self.url).json(notification).send().await?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transaction;
    use crate::notification::NotificationKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> Notification {
        Notification::new(
            NotificationKind::Received,
            "0xc22c7f8ba7de381a299ee4eb3a11e1316525ce45",
            Transaction {
                hash: "0xfeed".to_string(),
                from_address: "0xdd93e92dc32d0b2f51430b0e6da29bdd01af68d6".to_string(),
                to_address: Some("0xc22c7f8ba7de381a299ee4eb3a11e1316525ce45".to_string()),
                value: 1.0,
                value_wei: "1000000000000000000".to_string(),
                block_number: 6,
                timestamp: 1000,
            },
        )
    }

    #[tokio::test]
    async fn test_webhook_posts_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "type": "TRANSACTION_RECEIVED",
                "address": "0xc22c7f8ba7de381a299ee4eb3a11e1316525ce45",
                "transaction": {"hash": "0xfeed"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(&format!("{}/hook", mock_server.uri())).unwrap();
        notifier.notify(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_rejection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(&mock_server.uri()).unwrap();
        let result = notifier.notify(&notification()).await;

        assert!(matches!(result, Err(NotificationError::Rejected { status: 500 })));
    }
}
