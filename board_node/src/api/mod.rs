//! HTTP surface of the board service.

pub mod errors;
pub mod handlers;
pub mod validation;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::BoardConfig;
use crate::store::{EntityReader, EntityWriter};

pub use errors::{ApiError, ApiResult, ValidationError};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BoardConfig>,
    pub reader: Arc<dyn EntityReader>,
    pub writer: Arc<dyn EntityWriter>,
}

impl AppState {
    pub fn new(
        config: BoardConfig,
        reader: Arc<dyn EntityReader>,
        writer: Arc<dyn EntityWriter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            reader,
            writer,
        }
    }
}

/// Create the board router with message, signature and health endpoints
pub fn create_board_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::get_health))
        .route(
            "/messages",
            get(handlers::messages::list_messages).post(handlers::messages::create_message),
        )
        .route(
            "/signatures",
            get(handlers::signatures::list_signatures)
                .post(handlers::signatures::create_signature),
        )
        // Paths the web frontend calls
        .route(
            "/api/serverless-dapp101/messages",
            get(handlers::messages::list_messages).post(handlers::messages::create_message),
        )
        .route(
            "/api/signatures",
            get(handlers::signatures::list_signatures)
                .post(handlers::signatures::create_signature),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
