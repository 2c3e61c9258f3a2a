use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use leadsignal_common::{Lead, LeadSignalError, TextPart};

use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    lead: Option<Value>,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    leads: Option<Vec<Value>>,
    concurrency: Option<usize>,
    delay_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    pub duration_ms: u64,
    pub output: Vec<TextPart>,
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Vec<TextPart>>, ApiError> {
    let Json(body) = body?;
    let raw = body
        .lead
        .ok_or_else(|| ApiError::InvalidRequest("lead is required".to_string()))?;
    let lead = Lead::from_value(raw)?;

    let verdict = state.analyst.analyze(&lead).await?;
    Ok(Json(verdict.to_text_parts()?))
}

pub async fn api_analyze_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(body) = body?;
    let raw_leads = body
        .leads
        .ok_or_else(|| ApiError::InvalidRequest("leads is required".to_string()))?;

    let max_leads = state.config.batch_max_leads;
    if raw_leads.len() > max_leads {
        return Err(ApiError::InvalidRequest(format!(
            "batch of {} leads exceeds the limit of {max_leads}",
            raw_leads.len()
        )));
    }

    let leads = raw_leads
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            Lead::from_value(raw).map_err(|e| match e {
                LeadSignalError::Input(msg) => {
                    LeadSignalError::Input(format!("lead {i}: {msg}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let max_concurrency = state.config.batch_max_concurrency.max(1);
    let concurrency = body
        .concurrency
        .unwrap_or(max_concurrency)
        .clamp(1, max_concurrency);
    let delay = body
        .delay_ms
        .map(Duration::from_millis)
        .unwrap_or(state.config.batch_delay);

    info!(count = leads.len(), concurrency, "Batch analysis requested");
    let items = state
        .analyst
        .analyze_batch(leads, concurrency, delay)
        .await?;

    let results = items
        .into_iter()
        .map(|item| -> Result<BatchEntry, LeadSignalError> {
            Ok(BatchEntry {
                index: item.index,
                duration_ms: item.duration.as_millis() as u64,
                output: item.verdict.to_text_parts()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(BatchResponse { results }))
}
