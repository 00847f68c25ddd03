use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::api::AppState;

/// Response for the health check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Partitions every read queries, in order
    pub spaces: Vec<String>,
    pub writes_enabled: bool,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        spaces: state.config.read_partitions(),
        writes_enabled: state.config.writes_enabled(),
    })
}
