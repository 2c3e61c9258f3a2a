use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use leadsignal_common::{
    compute_freshness, enrich, Config, EnrichedVerdict, Lead, LeadSignalError, Result, Verdict,
};

use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::reply::ModelReply;
use crate::traits::{OpenAiVerdictModel, VerdictModel};

/// One entry of a batch run, in input order.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub index: usize,
    /// Time spent on the analysis itself, excluding the throttle delay.
    pub duration: Duration,
    pub verdict: EnrichedVerdict,
}

/// Runs leads through the model and applies freshness enrichment.
pub struct Analyst {
    model: Option<Arc<dyn VerdictModel>>,
    enrich_with_freshness: bool,
}

impl Analyst {
    pub fn new(model: Option<Arc<dyn VerdictModel>>) -> Self {
        Self {
            model,
            enrich_with_freshness: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let model = OpenAiVerdictModel::from_config(config)
            .map(|m| Arc::new(m) as Arc<dyn VerdictModel>);
        Self::new(model).with_freshness_enrichment(config.enrich_with_freshness)
    }

    pub fn with_freshness_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_with_freshness = enabled;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    fn model(&self) -> Result<&Arc<dyn VerdictModel>> {
        self.model.as_ref().ok_or_else(|| {
            LeadSignalError::Config("OPENAI_API_KEY is not configured".to_string())
        })
    }

    /// Analyze one lead.
    ///
    /// Fails on a missing credential or a failed model call. A reply that
    /// isn't a usable verdict is never an error: it becomes `UNCLEAR`.
    pub async fn analyze(&self, lead: &Lead) -> Result<EnrichedVerdict> {
        let verdict = self.request_verdict(lead).await?;
        Ok(self.finish(lead, verdict, Utc::now()))
    }

    /// Like [`Analyst::analyze`] with an explicit clock for freshness.
    pub async fn analyze_at(&self, lead: &Lead, now: DateTime<Utc>) -> Result<EnrichedVerdict> {
        let verdict = self.request_verdict(lead).await?;
        Ok(self.finish(lead, verdict, now))
    }

    async fn request_verdict(&self, lead: &Lead) -> Result<Verdict> {
        let model = self.model()?;
        let prompt = build_prompt(lead);

        let reply = match model.complete(SYSTEM_INSTRUCTION, &prompt).await {
            Ok(raw) => ModelReply::parse(&raw),
            Err(LeadSignalError::Parse(reason)) => ModelReply::Malformed {
                raw: String::new(),
                reason,
            },
            Err(e) => {
                warn!(lead = lead.label(), model = model.name(), error = %e, "Model call failed");
                return Err(e);
            }
        };

        if let ModelReply::Malformed { ref reason, .. } = reply {
            warn!(lead = lead.label(), reason = reason.as_str(), "Model reply unusable, degrading to UNCLEAR");
        }
        Ok(reply.into_verdict())
    }

    fn finish(&self, lead: &Lead, verdict: Verdict, now: DateTime<Utc>) -> EnrichedVerdict {
        if !self.enrich_with_freshness {
            return EnrichedVerdict::without_freshness(verdict);
        }

        let freshness = compute_freshness(lead.posted_at(), now);
        let enriched = enrich(verdict, freshness);
        info!(
            lead = lead.label(),
            verdict = %enriched.verdict.verdict,
            fresh = ?enriched.freshness.as_ref().and_then(|f| f.is_fresh),
            "Lead analyzed"
        );
        enriched
    }

    /// Analyze many leads, at most `concurrency` at a time. Each slot waits
    /// `delay` after finishing an analysis before picking up the next lead.
    ///
    /// Results come back in input order. A lead whose analysis fails is
    /// reported as `UNCLEAR`; only a missing credential fails the batch.
    pub async fn analyze_batch(
        &self,
        leads: Vec<Lead>,
        concurrency: usize,
        delay: Duration,
    ) -> Result<Vec<BatchItem>> {
        self.model()?;

        let concurrency = concurrency.max(1);
        let total = leads.len();
        info!(total, concurrency, delay_ms = delay.as_millis() as u64, "Starting batch analysis");

        let mut items: Vec<BatchItem> = stream::iter(leads.into_iter().enumerate().map(
            |(index, lead)| async move {
                let started = Instant::now();
                let verdict = match self.analyze(&lead).await {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(index, lead = lead.label(), error = %e, "Batch item failed, degrading to UNCLEAR");
                        self.failed_item(&lead, &e)
                    }
                };
                let duration = started.elapsed();

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                BatchItem {
                    index,
                    duration,
                    verdict,
                }
            },
        ))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        items.sort_by_key(|item| item.index);
        info!(total, "Batch analysis complete");
        Ok(items)
    }

    fn failed_item(&self, lead: &Lead, err: &LeadSignalError) -> EnrichedVerdict {
        let verdict = Verdict::unclear(
            format!("Analysis failed: {err}"),
            "Analysis could not be completed",
        );
        self.finish(lead, verdict, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModel;
    use leadsignal_common::{FetchResult, PostData, VerdictLabel};

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn lead_posted_at(name: &str, posted: Option<&str>) -> Lead {
        Lead {
            company_name: Some(name.to_string()),
            fetch_results: posted.map(|p| FetchResult {
                url: None,
                raw_data: PostData {
                    posted_at_iso: Some(p.to_string()),
                    ..PostData::default()
                },
            }),
            ..Lead::default()
        }
    }

    const GOOD_REPLY: &str =
        r#"{"verdict":"GOOD","reasoning":"strong signal","confidence":90,"red_flags":[]}"#;

    #[tokio::test]
    async fn missing_model_is_configuration_error() {
        let analyst = Analyst::new(None);
        let err = analyst.analyze(&Lead::default()).await.unwrap_err();
        assert!(matches!(err, LeadSignalError::Config(_)));

        let err = analyst
            .analyze_batch(vec![Lead::default()], 2, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadSignalError::Config(_)));
    }

    #[tokio::test]
    async fn fresh_lead_keeps_model_verdict() {
        let model = MockModel::new().default_reply(GOOD_REPLY);
        let analyst = Analyst::new(Some(Arc::new(model)));

        let lead = lead_posted_at("Acme", Some("2024-01-01T00:00:00Z"));
        let result = analyst.analyze_at(&lead, at("2024-01-01T02:00:00Z")).await.unwrap();

        assert_eq!(result.verdict.verdict, VerdictLabel::Good);
        assert_eq!(result.verdict.reasoning, "strong signal");
        assert_eq!(result.freshness.unwrap().is_fresh, Some(true));
    }

    #[tokio::test]
    async fn stale_lead_is_auto_rejected() {
        let model = MockModel::new().default_reply(GOOD_REPLY);
        let analyst = Analyst::new(Some(Arc::new(model)));

        let lead = lead_posted_at("Acme", Some("2024-01-01T00:00:00Z"));
        let result = analyst.analyze_at(&lead, at("2024-01-10T00:00:00Z")).await.unwrap();

        assert_eq!(result.verdict.verdict, VerdictLabel::Bad);
        assert!(result.verdict.reasoning.starts_with("[AUTO REJECTED: Post is 9 days old"));
        assert_eq!(result.verdict.red_flags.len(), 1);
    }

    #[tokio::test]
    async fn lead_without_post_date_passes_through() {
        let model = MockModel::new().default_reply(GOOD_REPLY);
        let analyst = Analyst::new(Some(Arc::new(model)));

        let result = analyst.analyze(&lead_posted_at("Acme", None)).await.unwrap();
        assert_eq!(result.verdict.verdict, VerdictLabel::Good);
        let freshness = result.freshness.unwrap();
        assert_eq!(freshness.is_fresh, None);
        assert!(!freshness.scraped_data);
    }

    #[tokio::test]
    async fn disabled_enrichment_skips_freshness() {
        let model = MockModel::new().default_reply(GOOD_REPLY);
        let analyst = Analyst::new(Some(Arc::new(model))).with_freshness_enrichment(false);

        let lead = lead_posted_at("Acme", Some("2020-01-01T00:00:00Z"));
        let result = analyst.analyze(&lead).await.unwrap();
        assert_eq!(result.verdict.verdict, VerdictLabel::Good);
        assert!(result.freshness.is_none());
    }

    #[tokio::test]
    async fn output_carries_only_computed_freshness() {
        const ECHOING_REPLY: &str = r#"{"verdict":"GOOD","reasoning":"r","freshness":{"isFresh":true,"status":"model says fresh"}}"#;
        let lead = lead_posted_at("Acme", Some("2024-01-01T00:00:00Z"));
        let now = at("2024-01-10T00:00:00Z");

        let analyst = Analyst::new(Some(Arc::new(MockModel::new().default_reply(ECHOING_REPLY))));
        let parts = analyst.analyze_at(&lead, now).await.unwrap().to_text_parts().unwrap();
        let text = &parts[0].text;
        assert_eq!(text.matches("\"freshness\"").count(), 1);
        assert!(!text.contains("model says fresh"));
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(value["freshness"]["isFresh"], false);
        assert_eq!(value["freshness"]["daysOld"], 9);

        let analyst = Analyst::new(Some(Arc::new(MockModel::new().default_reply(ECHOING_REPLY))))
            .with_freshness_enrichment(false);
        let parts = analyst.analyze_at(&lead, now).await.unwrap().to_text_parts().unwrap();
        let text = &parts[0].text;
        assert!(!text.contains("freshness"));
    }

    #[tokio::test]
    async fn malformed_reply_degrades_instead_of_failing() {
        let model = MockModel::new().default_reply("Sure! The lead looks promising.");
        let analyst = Analyst::new(Some(Arc::new(model)));

        let result = analyst.analyze(&Lead::default()).await.unwrap();
        assert_eq!(result.verdict.verdict, VerdictLabel::Unclear);
    }

    #[tokio::test]
    async fn unreadable_envelope_degrades_instead_of_failing() {
        let model = MockModel::new().fail_with(|| LeadSignalError::Parse("bad envelope".into()));
        let analyst = Analyst::new(Some(Arc::new(model)));

        let result = analyst.analyze(&Lead::default()).await.unwrap();
        assert_eq!(result.verdict.verdict, VerdictLabel::Unclear);
        assert!(result.verdict.reasoning.contains("bad envelope"));
    }

    #[tokio::test]
    async fn upstream_failure_propagates_for_single_lead() {
        let model = MockModel::new()
            .fail_with(|| LeadSignalError::upstream(Some(500), "{\"error\":\"overloaded\"}"));
        let analyst = Analyst::new(Some(Arc::new(model)));

        let err = analyst.analyze(&Lead::default()).await.unwrap_err();
        assert!(matches!(
            err,
            LeadSignalError::Upstream { status: Some(500), ref body } if body.contains("overloaded")
        ));
    }

    #[tokio::test]
    async fn prompt_reaches_model_with_system_instruction() {
        let model = Arc::new(MockModel::new().default_reply(GOOD_REPLY));
        let analyst = Analyst::new(Some(model.clone()));

        analyst.analyze(&lead_posted_at("Acme Bakery", None)).await.unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SYSTEM_INSTRUCTION);
        assert!(calls[0].1.contains("- Company Name: Acme Bakery"));
    }
}
