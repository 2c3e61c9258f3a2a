//! Post freshness scoring.
//!
//! A lead is only actionable while the social post behind it is recent. This
//! module turns a scraped publish timestamp into a [`FreshnessResult`]. It is
//! total: every input, however malformed, yields a well-formed result.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::FreshnessResult;

/// Posts older than this many hours are stale.
pub const FRESHNESS_WINDOW_HOURS: f64 = 24.0;

pub const STATUS_NO_DATE: &str = "Unknown - No post date available";
pub const STATUS_INVALID_DATE: &str = "Unknown - Invalid date format";
pub const STATUS_CALCULATION_ERROR: &str = "Unknown - Calculation error";
pub const STATUS_FUTURE: &str = "Fresh - Posted today or future scheduled";
pub const STATUS_WITHIN_HOUR: &str = "Fresh - Posted within the last hour";

/// Score the recency of a post published at `timestamp`, as seen at `now`.
///
/// Timestamps after `now` count as fresh with zero age. Scrapers report
/// scheduled posts and clocks drift, so these are tolerated rather than
/// rejected.
pub fn compute_freshness(timestamp: Option<&str>, now: DateTime<Utc>) -> FreshnessResult {
    let raw = match timestamp {
        Some(t) if !t.trim().is_empty() => t,
        _ => return FreshnessResult::unknown(STATUS_NO_DATE, None),
    };

    let Some(posted) = parse_timestamp(raw) else {
        return FreshnessResult::unknown(STATUS_INVALID_DATE, Some(raw.to_string()));
    };

    if posted > now {
        return FreshnessResult {
            is_fresh: Some(true),
            days_old: Some(0),
            post_age_hours: Some(0.0),
            timestamp: Some(raw.to_string()),
            status: STATUS_FUTURE.to_string(),
            scraped_data: true,
        };
    }

    let age_ms = now.signed_duration_since(posted).num_milliseconds();
    classify(age_ms as f64 / 3_600_000.0, raw)
}

/// Build the result for a post that is `age_hours` old.
fn classify(age_hours: f64, raw: &str) -> FreshnessResult {
    if !age_hours.is_finite() || age_hours < 0.0 {
        return FreshnessResult::unknown(STATUS_CALCULATION_ERROR, None);
    }

    let age_days = (age_hours / 24.0).floor() as u64;

    FreshnessResult {
        is_fresh: Some(age_hours <= FRESHNESS_WINDOW_HOURS),
        days_old: Some(age_days),
        post_age_hours: Some(round_to_hundredths(age_hours)),
        timestamp: Some(raw.to_string()),
        status: status_text(age_hours, age_days),
        scraped_data: true,
    }
}

/// First matching bucket wins.
fn status_text(age_hours: f64, age_days: u64) -> String {
    if age_hours <= 1.0 {
        STATUS_WITHIN_HOUR.to_string()
    } else if age_hours <= FRESHNESS_WINDOW_HOURS {
        format!("Fresh - Posted {age_hours:.1} hours ago")
    } else if age_days == 1 {
        "Stale - Posted 1 day ago".to_string()
    } else if age_days <= 7 {
        format!("Stale - Posted {age_days} days ago")
    } else if age_days <= 30 {
        format!("Stale - Posted {age_days} days ago ({} weeks)", age_days / 7)
    } else {
        format!("Stale - Posted {age_days} days ago ({} months)", age_days / 30)
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Accepts RFC 3339 (any offset), RFC 2822, naive date-times to the second
/// or minute (taken as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}
