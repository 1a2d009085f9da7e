use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::blockchain::Parser;
use crate::error::ParserError;
use crate::models::validate_address;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing 'address' parameter")]
    MissingAddress,
    #[error("{0}")]
    InvalidAddress(String),
    #[error("Address already subscribed")]
    AlreadySubscribed,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal server error")]
    Store(#[from] ParserError),
    #[error("Server error: {0}")]
    Server(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAddress | ApiError::InvalidAddress(_) | ApiError::AlreadySubscribed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(_) | ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingAddress => "MISSING_ADDRESS",
            ApiError::InvalidAddress(_) => "INVALID_ADDRESS",
            ApiError::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            ApiError::MethodNotAllowed => "INVALID_METHOD",
            ApiError::Store(_) | ApiError::Server(_) => "SERVER_ERROR",
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub error: u16,
    pub message: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(e) = &self {
            log::error!("Store failure while serving request: {}", e);
        }

        let status = self.status();
        let body = ErrorResponse {
            error: status.as_u16(),
            message: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentBlockResponse {
    pub current_block: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub status: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribersResponse {
    pub title: String,
    pub subscribers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<Parser>,
}

/// Build the query API router
pub fn router(parser: Arc<Parser>) -> Router {
    Router::new()
        .route("/currentBlock", get(get_current_block).fallback(method_not_allowed))
        .route("/subscribe", post(subscribe).fallback(method_not_allowed))
        .route("/transactions", get(get_transactions).fallback(method_not_allowed))
        .route("/subscribers", get(get_subscribers).fallback(method_not_allowed))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState { parser })
}

/// HTTP API server
pub struct ApiServer {
    parser: Arc<Parser>,
    pub address: String,
}

impl ApiServer {
    pub fn new(parser: Arc<Parser>, address: String) -> Self {
        Self { parser, address }
    }

    /// Serve until `shutdown` resolves
    pub async fn start_with_shutdown<F>(&self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", self.address, e)))?;

        log::info!("HTTP API server starting on {}", self.address);

        axum::serve(listener, router(self.parser.clone()))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }

    pub async fn start(&self) -> Result<(), ApiError> {
        self.start_with_shutdown(std::future::pending()).await
    }
}

fn required_address(query: AddressQuery) -> Result<String, ApiError> {
    let address = match query.address {
        Some(address) if !address.is_empty() => address,
        _ => return Err(ApiError::MissingAddress),
    };

    validate_address(&address.to_ascii_lowercase()).map_err(|e| match e {
        ParserError::InvalidAddress(message) => ApiError::InvalidAddress(message),
        other => ApiError::Store(other),
    })?;

    Ok(address)
}

/// GET /currentBlock
pub async fn get_current_block(State(state): State<AppState>) -> Result<Json<CurrentBlockResponse>, ApiError> {
    log::info!("Current block request");

    Ok(Json(CurrentBlockResponse {
        current_block: state.parser.get_current_block()?,
    }))
}

/// POST /subscribe?address=
pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let address = required_address(query).map_err(|e| {
        log::warn!("Rejected subscription request: {}", e);
        e
    })?;

    if state.parser.is_subscribed(&address)? {
        log::warn!("Address already subscribed: {}", address);
        return Err(ApiError::AlreadySubscribed);
    }

    if !state.parser.subscribe(&address)? {
        return Err(ApiError::InvalidAddress("Invalid address format".to_string()));
    }

    log::info!("Successfully subscribed address: {}", address);
    Ok(Json(SubscribeResponse {
        status: "success".to_string(),
        address,
    }))
}

/// GET /transactions?address=
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    let address = required_address(query)?;
    let transactions = state.parser.get_transactions(&address)?;

    if transactions.is_empty() {
        log::info!("No transactions found for address: {}", address);
        return Ok(Json(json!({
            "status": "not_found",
            "address": address,
            "transactions": [],
        }))
        .into_response());
    }

    log::debug!("Returning {} transactions for address {}", transactions.len(), address);
    Ok(Json(transactions).into_response())
}

/// GET /subscribers
pub async fn get_subscribers(State(state): State<AppState>) -> Result<Json<SubscribersResponse>, ApiError> {
    Ok(Json(SubscribersResponse {
        title: "Subscribers".to_string(),
        subscribers: state.parser.get_subscribers()?,
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
