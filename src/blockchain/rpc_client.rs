use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{is_local_endpoint, NetworkKind, NetworkSettings};
use crate::error::{ProtocolError, RpcError, TransportError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{parse_hex_u64, Block};
use crate::retry::{RetryConfig, RetryManager};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// JSON-RPC 2.0 client for a single node endpoint
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    settings: NetworkSettings,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Client tuned by the network profile the endpoint host implies
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        let endpoint = endpoint.into();
        let kind = if is_local_endpoint(&endpoint) {
            NetworkKind::Local
        } else {
            NetworkKind::Public
        };
        Self::with_settings(endpoint, NetworkSettings::for_kind(kind))
    }

    pub fn with_settings(endpoint: impl Into<String>, settings: NetworkSettings) -> Result<Self, RpcError> {
        let endpoint = endpoint.into();

        LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", serde_json::json!(endpoint))
            .with_metadata("network", serde_json::json!(format!("{:?}", settings.kind)))
            .with_metadata("timeout_ms", serde_json::json!(settings.request_timeout.as_millis() as u64))
            .with_metadata("retry_attempts", serde_json::json!(settings.retry_attempts))
            .info("Initializing RPC client");

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            client,
            endpoint,
            settings,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    /// Pause callers should leave between consecutive requests of one poll
    pub fn rate_limit_delay(&self) -> Duration {
        self.settings.rate_limit_delay
    }

    /// Issue a call, retrying transport failures per the network profile.
    /// A JSON `null` result is returned as `Value::Null`.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let retry = RetryManager::new(method, RetryConfig::from_network(&self.settings));

        retry
            .execute(|| async {
                let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
                let result = self.send_once(method, &params).await;
                let duration = monitor.finish_with_result(&result);

                MetricsLogger::log_rpc_call(method, duration, result.is_ok());
                result
            })
            .await
    }

    async fn send_once(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        LogContext::new("rpc_client", "send")
            .with_metadata("method", serde_json::json!(method))
            .with_metadata("id", serde_json::json!(request.id))
            .trace(&format!("Sending RPC request: {}", method));

        let timeout_seconds = self.settings.request_timeout.as_secs();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16() }.into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout_seconds))?;

        Ok(decode_response(&body)?)
    }

    /// `eth_blockNumber`, hex-decoded
    pub async fn get_latest_block_number(&self) -> Result<u64, RpcError> {
        let result = self.call("eth_blockNumber", vec![]).await?;

        let hex_string = result.as_str().ok_or_else(|| {
            ProtocolError::InvalidResponse(format!("Block number is not a string: {}", result))
        })?;

        let block_number = parse_hex_u64(hex_string).map_err(|e| {
            ProtocolError::InvalidResponse(format!("Failed to parse block number '{}': {}", hex_string, e))
        })?;

        LogContext::new("rpc_client", "get_latest_block_number")
            .with_block_number(block_number)
            .debug(&format!("Retrieved latest block number: {}", block_number));

        Ok(block_number)
    }

    /// `eth_getBlockByNumber` with full transaction objects; `None` when the node returns null
    pub async fn get_block(&self, block_number: u64) -> Result<Option<Block>, RpcError> {
        let params = vec![
            Value::String(format!("0x{:x}", block_number)),
            Value::Bool(true),
        ];

        let result = self.call("eth_getBlockByNumber", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let block: Block = serde_json::from_value(result).map_err(ProtocolError::Decode)?;

        LogContext::new("rpc_client", "get_block")
            .with_block_number(block_number)
            .with_metadata(
                "transaction_count",
                serde_json::json!(block.transactions.as_ref().map(|txs| txs.len())),
            )
            .debug(&format!("Retrieved block {}", block_number));

        Ok(Some(block))
    }
}

/// Turn a response body into the `result` value or a protocol error
fn decode_response(body: &[u8]) -> Result<Value, ProtocolError> {
    let response: Value = serde_json::from_slice(body)?;

    let object = response
        .as_object()
        .ok_or_else(|| ProtocolError::InvalidResponse("response is not a JSON object".to_string()))?;

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let error: JsonRpcErrorObject = serde_json::from_value(error.clone())
            .map_err(|_| ProtocolError::InvalidResponse(format!("malformed error object: {}", error)))?;
        return Err(ProtocolError::Node {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    object.get("result").cloned().ok_or(ProtocolError::MissingResult)
}
