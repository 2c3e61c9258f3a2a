use ai_client::{extract_json_object, truncate_to_char_boundary};
use serde_json::{Map, Value};

use leadsignal_common::{Verdict, VerdictLabel};

/// Longest slice of a malformed reply echoed back to the caller.
const RAW_REPLY_PREVIEW_BYTES: usize = 2000;

/// Keys the verdict shape knows about. Everything else goes to `Verdict::extra`.
const KNOWN_KEYS: [&str; 7] = [
    "verdict",
    "reasoning",
    "confidence",
    "key_factors",
    "red_flags",
    "opportunity_score",
    "recommended_action",
];

/// Keys the enriched output owns. A model echoing them is dropped, never
/// carried into `Verdict::extra`.
const RESERVED_KEYS: [&str; 1] = ["freshness"];

/// The model's reply after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Parsed(Verdict),
    Malformed { raw: String, reason: String },
}

impl ModelReply {
    /// Validate a raw reply. `verdict` and `reasoning` must be present as
    /// strings; the remaining keys are best-effort.
    pub fn parse(raw: &str) -> Self {
        let malformed = |reason: String| ModelReply::Malformed {
            raw: raw.to_string(),
            reason,
        };

        let value: Value = match serde_json::from_str(extract_json_object(raw)) {
            Ok(v) => v,
            Err(e) => return malformed(format!("reply is not valid JSON: {e}")),
        };
        let Value::Object(mut map) = value else {
            return malformed("reply is not a JSON object".to_string());
        };

        let Some(label) = map.get("verdict").and_then(Value::as_str) else {
            return malformed("missing required key \"verdict\"".to_string());
        };
        let verdict = VerdictLabel::parse_lenient(label);

        let Some(reasoning) = map.get("reasoning").and_then(Value::as_str) else {
            return malformed("missing required key \"reasoning\"".to_string());
        };
        let reasoning = reasoning.to_string();

        let parsed = Verdict {
            verdict,
            reasoning,
            confidence: score(map.get("confidence")),
            key_factors: string_list(map.get("key_factors")),
            red_flags: string_list(map.get("red_flags")),
            opportunity_score: score(map.get("opportunity_score")),
            recommended_action: map
                .get("recommended_action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            extra: Map::new(),
        };

        for key in KNOWN_KEYS.iter().chain(&RESERVED_KEYS) {
            map.remove(*key);
        }
        ModelReply::Parsed(Verdict { extra: map, ..parsed })
    }

    /// The verdict to hand on: the parsed one, or an `UNCLEAR` placeholder
    /// carrying a preview of what the model actually said.
    pub fn into_verdict(self) -> Verdict {
        match self {
            ModelReply::Parsed(verdict) => verdict,
            ModelReply::Malformed { raw, reason } => {
                let mut verdict = Verdict::unclear(
                    format!("Unable to parse AI response: {reason}"),
                    "AI response could not be parsed",
                );
                verdict.extra.insert(
                    "raw_response".to_string(),
                    Value::String(truncate_to_char_boundary(&raw, RAW_REPLY_PREVIEW_BYTES).to_string()),
                );
                verdict
            }
        }
    }
}

/// 0–100 score from a number or numeric string. Anything else is 0.
fn score(value: Option<&Value>) -> u8 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

/// A list of strings; a lone string becomes a one-item list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
