pub mod analyze;
pub mod proof;

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_configured: bool,
    pub scraper_configured: bool,
}

pub async fn root() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_configured: state.analyst.is_configured(),
        scraper_configured: state.proof_fetcher.is_configured(),
    })
}
