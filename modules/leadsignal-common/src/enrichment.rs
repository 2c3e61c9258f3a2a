use crate::types::{EnrichedVerdict, FreshnessResult, Verdict, VerdictLabel};

/// Attach freshness to a model verdict.
///
/// A post that is known to be stale overrides the model outright: the verdict
/// becomes `BAD`, the reasoning is prefixed with the rejection reason, and a
/// red flag is appended. Fresh and unknown freshness leave the verdict as the
/// model produced it.
pub fn enrich(verdict: Verdict, freshness: FreshnessResult) -> EnrichedVerdict {
    if !freshness.is_stale() {
        return EnrichedVerdict {
            verdict,
            freshness: Some(freshness),
        };
    }

    let days = freshness
        .days_old
        .map_or_else(|| "unknown".to_string(), |d| d.to_string());

    let mut red_flags = verdict.red_flags;
    red_flags.push(format!("Lead is {days} days old - exceeds freshness threshold"));

    EnrichedVerdict {
        verdict: Verdict {
            verdict: VerdictLabel::Bad,
            reasoning: format!(
                "[AUTO REJECTED: Post is {days} days old - exceeds 24-hour freshness requirement] {}",
                verdict.reasoning
            ),
            red_flags,
            ..verdict
        },
        freshness: Some(freshness),
    }
}
