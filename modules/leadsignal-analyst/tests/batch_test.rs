//! Batch orchestration against the mock model: ordering, the concurrency cap,
//! per-slot throttling and per-item failure isolation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use leadsignal_analyst::testing::MockModel;
use leadsignal_analyst::Analyst;
use leadsignal_common::{Lead, LeadSignalError, VerdictLabel};

fn lead(name: &str) -> Lead {
    Lead {
        company_name: Some(name.to_string()),
        ..Lead::default()
    }
}

fn needle(name: &str) -> String {
    format!("- Company Name: {name}\n")
}

fn reply(label: &str, reasoning: &str) -> String {
    serde_json::json!({ "verdict": label, "reasoning": reasoning, "confidence": 80 }).to_string()
}

#[tokio::test]
async fn results_come_back_in_input_order() {
    // Lead-0 is the slowest, so it finishes last.
    let model = MockModel::new()
        .on_prompt(&needle("Lead-0"), Duration::from_millis(150), &reply("GOOD", "zero"))
        .on_prompt(&needle("Lead-1"), Duration::from_millis(10), &reply("BAD", "one"))
        .on_prompt(&needle("Lead-2"), Duration::from_millis(10), &reply("UNCLEAR", "two"));
    let analyst = Analyst::new(Some(Arc::new(model)));

    let leads = vec![lead("Lead-0"), lead("Lead-1"), lead("Lead-2")];
    let items = analyst.analyze_batch(leads, 2, Duration::ZERO).await.unwrap();

    let indices: Vec<usize> = items.iter().map(|i| i.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let reasons: Vec<&str> = items.iter().map(|i| i.verdict.verdict.reasoning.as_str()).collect();
    assert_eq!(reasons, vec!["zero", "one", "two"]);
    assert_eq!(items[1].verdict.verdict.verdict, VerdictLabel::Bad);
    assert!(items[0].duration >= Duration::from_millis(150));
}

#[tokio::test]
async fn concurrency_cap_is_respected() {
    let mut model = MockModel::new();
    for i in 0..6 {
        model = model.on_prompt(
            &needle(&format!("Lead-{i}")),
            Duration::from_millis(40),
            &reply("GOOD", "ok"),
        );
    }
    let model = Arc::new(model);
    let analyst = Analyst::new(Some(model.clone()));

    let leads = (0..6).map(|i| lead(&format!("Lead-{i}"))).collect();
    let items = analyst.analyze_batch(leads, 2, Duration::ZERO).await.unwrap();

    assert_eq!(items.len(), 6);
    assert_eq!(model.calls().len(), 6);
    assert!(model.max_in_flight() <= 2, "saw {} in flight", model.max_in_flight());
    assert_eq!(model.max_in_flight(), 2);
}

/// Every lead's reply takes `delay`, so overlapping calls are observable.
fn slow_model(names: &[&str], delay: Duration) -> MockModel {
    names.iter().fold(MockModel::new(), |model, name| {
        model.on_prompt(&needle(name), delay, &reply("GOOD", "ok"))
    })
}

#[tokio::test]
async fn zero_concurrency_runs_one_at_a_time() {
    let names = ["A", "B", "C", "D"];
    let model = Arc::new(slow_model(&names, Duration::from_millis(30)));
    let analyst = Analyst::new(Some(model.clone()));

    let leads = names.iter().map(|n| lead(n)).collect();
    let items = analyst.analyze_batch(leads, 0, Duration::ZERO).await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(model.calls().len(), 4);
    assert_eq!(model.max_in_flight(), 1);
}

#[tokio::test]
async fn uncapped_slots_overlap() {
    let names = ["A", "B", "C", "D"];
    let model = Arc::new(slow_model(&names, Duration::from_millis(30)));
    let analyst = Analyst::new(Some(model.clone()));

    let leads = names.iter().map(|n| lead(n)).collect();
    analyst.analyze_batch(leads, 4, Duration::ZERO).await.unwrap();

    assert_eq!(model.max_in_flight(), 4);
}

#[tokio::test]
async fn failed_item_degrades_without_failing_batch() {
    let model = MockModel::new()
        .fail_on_prompt(&needle("Lead-1"), Duration::ZERO, || {
            LeadSignalError::upstream(Some(500), "model overloaded")
        })
        .default_reply(&reply("GOOD", "fine"));
    let analyst = Analyst::new(Some(Arc::new(model)));

    let leads = vec![lead("Lead-0"), lead("Lead-1"), lead("Lead-2")];
    let items = analyst.analyze_batch(leads, 3, Duration::ZERO).await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].verdict.verdict.verdict, VerdictLabel::Good);
    assert_eq!(items[2].verdict.verdict.verdict, VerdictLabel::Good);

    let failed = &items[1].verdict.verdict;
    assert_eq!(failed.verdict, VerdictLabel::Unclear);
    assert!(failed.reasoning.contains("model overloaded"));
    assert_eq!(failed.confidence, 0);
}

#[tokio::test]
async fn delay_is_applied_after_each_analysis() {
    let model = MockModel::new().default_reply(&reply("GOOD", "ok"));
    let analyst = Analyst::new(Some(Arc::new(model)));

    let started = Instant::now();
    let leads = vec![lead("A"), lead("B"), lead("C")];
    let items = analyst
        .analyze_batch(leads, 1, Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(150));
    // The throttle is not counted as analysis time.
    assert!(items.iter().all(|i| i.duration < Duration::from_millis(50)));
}

#[tokio::test]
async fn empty_batch_returns_no_results() {
    let model = Arc::new(MockModel::new().default_reply(&reply("GOOD", "ok")));
    let analyst = Analyst::new(Some(model.clone()));

    let items = analyst.analyze_batch(Vec::new(), 5, Duration::ZERO).await.unwrap();
    assert!(items.is_empty());
    assert!(model.calls().is_empty());
}
