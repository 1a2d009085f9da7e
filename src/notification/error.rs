use thiserror::Error;

/// Failures while delivering a notification to a sink
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Sink rejected notification with HTTP status {status}")]
    Rejected { status: u16 },

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(error: reqwest::Error) -> Self {
        NotificationError::Network(error.to_string())
    }
}
