use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// --- Proof fetch ---

/// Normalized output of a proof fetch: the scraped post behind a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "rawData")]
    pub raw_data: PostData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    /// ISO-8601 publish time of the post, when the scraper found one.
    #[serde(default)]
    pub posted_at_iso: Option<String>,
    #[serde(default, rename = "postText", alias = "post_text")]
    pub post_text: Option<String>,
    #[serde(
        default,
        rename = "authorName",
        alias = "author_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_name: Option<String>,
    /// Earlier posts by the same author, newest first as the scraper returned them.
    #[serde(
        default,
        rename = "previousPosts",
        alias = "previous_posts",
        alias = "recentPosts",
        deserialize_with = "deserialize_snippets"
    )]
    pub previous_posts: Vec<String>,
}

/// Pull a text snippet out of a post entry that is either a bare string or
/// an object with one of the usual text keys.
pub fn snippet_from_value(value: &Value) -> Option<String> {
    const TEXT_KEYS: [&str; 5] = ["text", "snippet", "postText", "content", "commentary"];

    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str).filter(|s| !s.trim().is_empty())),
        _ => None,
    }?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn deserialize_snippets<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(snippet_from_value)
        .collect())
}

// --- Freshness ---

/// Recency verdict for the post backing a lead. `None` fields mean unknown
/// and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessResult {
    pub is_fresh: Option<bool>,
    pub days_old: Option<u64>,
    pub post_age_hours: Option<f64>,
    pub timestamp: Option<String>,
    pub status: String,
    pub scraped_data: bool,
}

impl FreshnessResult {
    pub fn unknown(status: impl Into<String>, timestamp: Option<String>) -> Self {
        Self {
            is_fresh: None,
            days_old: None,
            post_age_hours: None,
            timestamp,
            status: status.into(),
            scraped_data: false,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_fresh == Some(false)
    }
}

// --- Verdict ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictLabel {
    Good,
    Bad,
    Unclear,
}

impl VerdictLabel {
    /// Case-insensitive; anything unrecognised is `Unclear`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GOOD" => VerdictLabel::Good,
            "BAD" => VerdictLabel::Bad,
            _ => VerdictLabel::Unclear,
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictLabel::Good => write!(f, "GOOD"),
            VerdictLabel::Bad => write!(f, "BAD"),
            VerdictLabel::Unclear => write!(f, "UNCLEAR"),
        }
    }
}

/// The model's judgment of a lead. Keys the model adds beyond the known
/// shape are kept in `extra` and passed through to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: VerdictLabel,
    pub reasoning: String,
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub opportunity_score: u8,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Verdict {
    /// Placeholder verdict used when the model's answer can't be used.
    pub fn unclear(reasoning: impl Into<String>, red_flag: impl Into<String>) -> Self {
        Self {
            verdict: VerdictLabel::Unclear,
            reasoning: reasoning.into(),
            confidence: 0,
            key_factors: Vec::new(),
            red_flags: vec![red_flag.into()],
            opportunity_score: 0,
            recommended_action: "Review this lead manually".to_string(),
            extra: Map::new(),
        }
    }
}

/// Terminal artifact of an analysis: the verdict with freshness attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedVerdict {
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<FreshnessResult>,
}

impl EnrichedVerdict {
    /// Verdict returned as-is, for deployments with freshness enrichment off.
    pub fn without_freshness(verdict: Verdict) -> Self {
        Self {
            verdict,
            freshness: None,
        }
    }

    /// The `[{"text": "<json>"}]` envelope the frontend expects.
    pub fn to_text_parts(&self) -> Result<Vec<TextPart>> {
        Ok(vec![TextPart {
            text: serde_json::to_string(self)?,
        }])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}
