use std::sync::Arc;

use apify_client::SessionCookie;
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value};
use tracing::{info, warn};

use leadsignal_common::types::snippet_from_value;
use leadsignal_common::{Config, FetchResult, LeadSignalError, PostData, Result};

use crate::traits::{ApifyPostScraper, PostScraper};

// Field-name fallbacks for scraper output, most specific first. Post scraper
// actors disagree on naming and occasionally rename fields between versions.
const POSTED_AT_KEYS: [&str; 7] = [
    "postedAtISO",
    "posted_at_iso",
    "postedAt",
    "publishedAt",
    "date",
    "createdAt",
    "timestamp",
];
const POSTED_AT_MILLIS_KEYS: [&str; 2] = ["postedAtTimestamp", "timestampMs"];
const TEXT_KEYS: [&str; 4] = ["text", "postText", "content", "commentary"];
const AUTHOR_KEYS: [&str; 3] = ["authorName", "author_name", "author"];
const PREVIOUS_POST_KEYS: [&str; 4] = ["previousPosts", "authorPosts", "recentPosts", "posts"];

/// Fetches the social post behind a lead's proof URL.
pub struct ProofFetcher {
    scraper: Option<Arc<dyn PostScraper>>,
    cookies: Option<String>,
}

impl ProofFetcher {
    /// `cookies` is the raw JSON cookie list; it is validated on each fetch.
    pub fn new(scraper: Option<Arc<dyn PostScraper>>, cookies: Option<String>) -> Self {
        Self { scraper, cookies }
    }

    pub fn from_config(config: &Config) -> Self {
        let scraper =
            ApifyPostScraper::from_config(config).map(|s| Arc::new(s) as Arc<dyn PostScraper>);
        Self::new(scraper, config.scraper_cookies.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.scraper.is_some() && self.cookies.is_some()
    }

    pub async fn fetch_proof(&self, proof_url: &str) -> Result<FetchResult> {
        let url = validate_proof_url(proof_url)?;

        let scraper = self.scraper.as_ref().ok_or_else(|| {
            LeadSignalError::Config("APIFY_API_TOKEN is not configured".to_string())
        })?;
        let cookies = parse_session_cookies(self.cookies.as_deref())?;

        info!(url = url.as_str(), "Fetching proof post");
        let items = scraper.scrape_post(&url, cookies).await?;

        let Some(first) = items.first() else {
            warn!(url = url.as_str(), "Scraper returned no data");
            return Err(LeadSignalError::upstream(
                None,
                format!("No data returned for {url}"),
            ));
        };

        let fetch = normalize_post(first, &url);
        info!(
            url = url.as_str(),
            has_date = fetch.raw_data.posted_at_iso.is_some(),
            previous_posts = fetch.raw_data.previous_posts.len(),
            "Proof post fetched"
        );
        Ok(fetch)
    }
}

fn validate_proof_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LeadSignalError::Input("proof URL is required".to_string()));
    }
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| LeadSignalError::Input(format!("proof URL is not a valid URL: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(LeadSignalError::Input(format!(
            "proof URL must use http or https, got {}",
            parsed.scheme()
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate the configured cookie material: a non-empty JSON list of
/// `{name, value, ...}` records.
pub fn parse_session_cookies(raw: Option<&str>) -> Result<Vec<SessionCookie>> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| LeadSignalError::Config("SCRAPER_COOKIES is not configured".to_string()))?;

    let cookies: Vec<SessionCookie> = serde_json::from_str(raw).map_err(|e| {
        LeadSignalError::Config(format!(
            "SCRAPER_COOKIES must be a JSON list of cookie objects with name and value: {e}"
        ))
    })?;

    if cookies.is_empty() {
        return Err(LeadSignalError::Config(
            "SCRAPER_COOKIES contains no cookies".to_string(),
        ));
    }
    Ok(cookies)
}

/// Map one raw scraper record onto a [`FetchResult`].
pub fn normalize_post(item: &Value, url: &str) -> FetchResult {
    let empty = Map::new();
    let record = item.as_object().unwrap_or(&empty);

    let text = TEXT_KEYS
        .iter()
        .find_map(|k| non_empty_str(record.get(*k)))
        .map(str::to_string);

    let previous_posts = PREVIOUS_POST_KEYS
        .iter()
        .find_map(|k| record.get(*k).and_then(Value::as_array))
        .map(|posts| posts.iter().filter_map(snippet_from_value).collect())
        .unwrap_or_default();

    FetchResult {
        url: Some(url.to_string()),
        raw_data: PostData {
            posted_at_iso: posted_at(record),
            post_text: text,
            author_name: author_name(record),
            previous_posts,
        },
    }
}

fn posted_at(record: &Map<String, Value>) -> Option<String> {
    for key in POSTED_AT_KEYS {
        match record.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            // Some actors nest the date: {"postedAt": {"date": "...", "timestamp": 1704067200000}}
            Some(Value::Object(nested)) => {
                if let Some(s) = non_empty_str(nested.get("date")).or(non_empty_str(nested.get("iso"))) {
                    return Some(s.to_string());
                }
                if let Some(iso) = nested.get("timestamp").and_then(millis_to_iso) {
                    return Some(iso);
                }
            }
            _ => {}
        }
    }
    POSTED_AT_MILLIS_KEYS
        .iter()
        .find_map(|k| record.get(*k).and_then(millis_to_iso))
}

fn millis_to_iso(value: &Value) -> Option<String> {
    let millis = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn author_name(record: &Map<String, Value>) -> Option<String> {
    AUTHOR_KEYS.iter().find_map(|k| match record.get(*k) {
        Some(Value::Object(author)) => non_empty_str(author.get("name"))
            .or(non_empty_str(author.get("fullName")))
            .map(str::to_string),
        other => non_empty_str(other).map(str::to_string),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
