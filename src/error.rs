use thiserror::Error;

/// Main error type for the transaction parser
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(#[from] TransactionError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification error: {0}")]
    Notification(#[from] crate::notification::NotificationError),
}

/// Errors raised by the node client
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// The HTTP exchange with the node could not complete
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected HTTP status: {status}")]
    Status { status: u16 },
}

/// The node answered, but not with a usable JSON-RPC result
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to decode JSON-RPC response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Node returned error: code={code}, message={message}")]
    Node {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Response carried neither result nor error")]
    MissingResult,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Field-level validation failures for a raw transaction record
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("transaction record is not an object")]
    NotAnObject,

    #[error("invalid or missing '{field}'")]
    MissingField { field: &'static str },

    #[error("error parsing '{field}' from '{value}': {reason}")]
    InvalidHex {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Storage backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database operation failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ParserError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl RpcError {
    /// Transport failures are worth another attempt; a well-formed error from the node is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}

impl TransportError {
    /// Classify a reqwest failure, keeping timeouts and refused connections distinguishable
    pub fn from_reqwest(error: reqwest::Error, timeout_seconds: u64) -> Self {
        if error.is_timeout() {
            TransportError::Timeout { seconds: timeout_seconds }
        } else if error.is_connect() {
            TransportError::Connection(error.to_string())
        } else {
            TransportError::Http(error)
        }
    }
}

impl ParserError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ParserError::Config(_) => ErrorSeverity::Critical,
            ParserError::Storage(StorageError::Database(_)) => ErrorSeverity::Critical,
            ParserError::Storage(_) => ErrorSeverity::High,

            ParserError::Rpc(RpcError::Transport(TransportError::Connection(_))) => ErrorSeverity::High,
            ParserError::Rpc(RpcError::Transport(_)) => ErrorSeverity::Medium,
            ParserError::Rpc(RpcError::Protocol(_)) => ErrorSeverity::Medium,
            ParserError::Notification(_) => ErrorSeverity::Medium,

            ParserError::MalformedTransaction(_) => ErrorSeverity::Low,
            ParserError::InvalidAddress(_) => ErrorSeverity::Low,
        }
    }

    /// Check if the error is recoverable by retrying the same operation
    pub fn is_recoverable(&self) -> bool {
        match self {
            ParserError::Rpc(e) => e.is_retryable(),
            ParserError::Storage(StorageError::Lock(_)) => true,
            _ => false,
        }
    }
}

impl From<TransportError> for ParserError {
    fn from(err: TransportError) -> Self {
        ParserError::Rpc(RpcError::Transport(err))
    }
}

impl From<ProtocolError> for ParserError {
    fn from(err: ProtocolError) -> Self {
        ParserError::Rpc(RpcError::Protocol(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let critical = ParserError::Config(ConfigError::InvalidUrl("nope".to_string()));
        assert_eq!(critical.severity(), ErrorSeverity::Critical);

        let high = ParserError::from(TransportError::Connection("refused".to_string()));
        assert_eq!(high.severity(), ErrorSeverity::High);

        let medium = ParserError::from(ProtocolError::MissingResult);
        assert_eq!(medium.severity(), ErrorSeverity::Medium);

        let low = ParserError::InvalidAddress("0x123".to_string());
        assert_eq!(low.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(RpcError::from(TransportError::Timeout { seconds: 5 }).is_retryable());
        assert!(RpcError::from(TransportError::Status { status: 503 }).is_retryable());
        assert!(!RpcError::from(ProtocolError::MissingResult).is_retryable());
        assert!(!RpcError::from(ProtocolError::Node {
            code: -32600,
            message: "Invalid request".to_string(),
            data: None,
        })
        .is_retryable());
    }

    #[test]
    fn test_error_recoverability() {
        let recoverable = ParserError::from(TransportError::Status { status: 502 });
        assert!(recoverable.is_recoverable());

        let malformed = ParserError::from(TransactionError::MissingField { field: "hash" });
        assert!(!malformed.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = ParserError::from(ProtocolError::Node {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        });
        assert_eq!(
            format!("{}", error),
            "RPC error: Protocol error: Node returned error: code=-32601, message=Method not found"
        );

        let malformed = ParserError::from(TransactionError::MissingField { field: "hash" });
        assert_eq!(format!("{}", malformed), "Malformed transaction: invalid or missing 'hash'");
    }
}
