use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an actor run, as reported in `RunData::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" | "ABORTED" | "TIMED-OUT" | "TIMED_OUT" => RunStatus::Failed,
            _ => RunStatus::Running,
        }
    }
}

/// A browser session cookie handed to actors that need a logged-in session.
///
/// Only `name` and `value` are required; everything else an export tool
/// emits (`domain`, `path`, `expirationDate`, `httpOnly`, ...) is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Input for single-post scraper actors that take a URL list plus cookies.
#[derive(Debug, Clone, Serialize)]
pub struct PostScraperInput {
    pub urls: Vec<String>,
    #[serde(rename = "cookie")]
    pub cookies: Vec<SessionCookie>,
}
