// Test mocks for the two collaborator seams.
//
// - MockModel (VerdictModel): canned replies matched on prompt text, optional per-reply delay
// - MockScraper (PostScraper): URL→dataset items, records the cookies it was handed

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use apify_client::SessionCookie;
use async_trait::async_trait;
use serde_json::Value;

use leadsignal_common::{LeadSignalError, Result};

use crate::traits::{PostScraper, VerdictModel};

// ---------------------------------------------------------------------------
// MockModel
// ---------------------------------------------------------------------------

struct CannedReply {
    needle: String,
    delay: Duration,
    reply: std::result::Result<String, ErrorFactory>,
}

type ErrorFactory = Box<dyn Fn() -> LeadSignalError + Send + Sync>;

/// Model double. Replies are chosen by the first registered needle found in
/// the prompt, falling back to the default reply.
pub struct MockModel {
    canned: Vec<CannedReply>,
    default: Option<std::result::Result<String, ErrorFactory>>,
    calls: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            canned: Vec::new(),
            default: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn default_reply(mut self, reply: &str) -> Self {
        self.default = Some(Ok(reply.to_string()));
        self
    }

    pub fn fail_with(mut self, err: impl Fn() -> LeadSignalError + Send + Sync + 'static) -> Self {
        self.default = Some(Err(Box::new(err)));
        self
    }

    /// Reply with `reply` after `delay` when the prompt contains `needle`.
    pub fn on_prompt(mut self, needle: &str, delay: Duration, reply: &str) -> Self {
        self.canned.push(CannedReply {
            needle: needle.to_string(),
            delay,
            reply: Ok(reply.to_string()),
        });
        self
    }

    /// Fail after `delay` when the prompt contains `needle`.
    pub fn fail_on_prompt(
        mut self,
        needle: &str,
        delay: Duration,
        err: impl Fn() -> LeadSignalError + Send + Sync + 'static,
    ) -> Self {
        self.canned.push(CannedReply {
            needle: needle.to_string(),
            delay,
            reply: Err(Box::new(err)),
        });
        self
    }

    /// Every `(system, prompt)` pair received, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerdictModel for MockModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let canned = self.canned.iter().find(|c| prompt.contains(&c.needle));
        let delay = canned.map(|c| c.delay).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = canned.map(|c| &c.reply).or(self.default.as_ref());
        match reply {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(make_err)) => Err(make_err()),
            None => Err(LeadSignalError::upstream(
                Some(404),
                format!("MockModel: no reply registered for prompt ({} chars)", prompt.len()),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock-model"
    }
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Scraper double. Unregistered URLs return an empty dataset.
pub struct MockScraper {
    items: HashMap<String, Vec<Value>>,
    failures: HashMap<String, (Option<u16>, String)>,
    seen_cookies: Mutex<Vec<Vec<SessionCookie>>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            failures: HashMap::new(),
            seen_cookies: Mutex::new(Vec::new()),
        }
    }

    pub fn on_url(mut self, url: &str, items: Vec<Value>) -> Self {
        self.items.insert(url.to_string(), items);
        self
    }

    pub fn fail_on_url(mut self, url: &str, status: Option<u16>, body: &str) -> Self {
        self.failures
            .insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// Cookie lists received, one entry per scrape call.
    pub fn seen_cookies(&self) -> Vec<Vec<SessionCookie>> {
        self.seen_cookies.lock().unwrap().clone()
    }
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostScraper for MockScraper {
    async fn scrape_post(&self, url: &str, cookies: Vec<SessionCookie>) -> Result<Vec<Value>> {
        self.seen_cookies.lock().unwrap().push(cookies);

        if let Some((status, body)) = self.failures.get(url) {
            return Err(LeadSignalError::upstream(*status, body.clone()));
        }
        Ok(self.items.get(url).cloned().unwrap_or_default())
    }
}
