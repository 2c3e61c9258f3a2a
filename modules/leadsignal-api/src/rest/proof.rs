use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Deserialize;

use leadsignal_common::FetchResult;

use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct FetchProofRequest {
    #[serde(alias = "proofUrl", alias = "url")]
    proof_url: Option<String>,
}

pub async fn api_fetch_proof(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FetchProofRequest>, JsonRejection>,
) -> Result<Json<FetchResult>, ApiError> {
    let Json(body) = body?;
    let url = body
        .proof_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("proof_url is required".to_string()))?;

    let fetch = state.proof_fetcher.fetch_proof(&url).await?;
    Ok(Json(fetch))
}
