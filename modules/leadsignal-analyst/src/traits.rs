// Trait seams for the two collaborators.
//
// VerdictModel: the LLM that judges a lead.
// PostScraper: the actor that scrapes a proof post.
//
// Orchestrators hold these as `Arc<dyn ...>` so tests swap in the mocks from
// `testing` with no network.

use ai_client::{AiError, OpenAi, PromptBuilder};
use apify_client::{ApifyClient, ApifyError, SessionCookie};
use async_trait::async_trait;
use serde_json::Value;

use leadsignal_common::{Config, LeadSignalError, Result};

// ---------------------------------------------------------------------------
// VerdictModel
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VerdictModel: Send + Sync {
    /// Send one system instruction plus one prompt; return the raw reply text.
    ///
    /// Transport and HTTP failures are `Upstream`. A reply envelope that can't
    /// be read is `Parse`.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// OpenAI-compatible chat model in JSON-object mode.
pub struct OpenAiVerdictModel {
    agent: OpenAi,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiVerdictModel {
    pub fn new(agent: OpenAi, temperature: f32, max_tokens: u32) -> Self {
        Self {
            agent,
            temperature,
            max_tokens,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let key = config.openai_api_key.as_ref()?;
        let agent = OpenAi::new(key.clone(), config.analysis_model.clone())
            .with_base_url(config.openai_base_url.clone());
        Some(Self::new(
            agent,
            config.analysis_temperature,
            config.analysis_max_tokens,
        ))
    }
}

#[async_trait]
impl VerdictModel for OpenAiVerdictModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        self.agent
            .prompt(prompt)
            .preamble(system)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .json_object()
            .send()
            .await
            .map_err(from_ai_error)
    }

    fn name(&self) -> &str {
        self.agent.model()
    }
}

fn from_ai_error(err: AiError) -> LeadSignalError {
    match err {
        AiError::Config(msg) => LeadSignalError::Config(msg),
        AiError::Api { status, body } => LeadSignalError::upstream(Some(status), body),
        AiError::Network(msg) => LeadSignalError::upstream(None, msg),
        AiError::Parse(msg) | AiError::Empty(msg) => LeadSignalError::Parse(msg),
    }
}

// ---------------------------------------------------------------------------
// PostScraper
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PostScraper: Send + Sync {
    /// Scrape one post URL. Returns the actor's raw dataset items.
    async fn scrape_post(&self, url: &str, cookies: Vec<SessionCookie>) -> Result<Vec<Value>>;
}

/// Apify actor-backed scraper.
pub struct ApifyPostScraper {
    client: ApifyClient,
    actor_id: String,
}

impl ApifyPostScraper {
    pub fn new(client: ApifyClient, actor_id: impl Into<String>) -> Self {
        Self {
            client,
            actor_id: actor_id.into(),
        }
    }

    /// `None` when no Apify token is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let token = config.apify_api_token.as_ref()?;
        Some(Self::new(
            ApifyClient::new(token.clone()),
            config.apify_post_scraper_actor.clone(),
        ))
    }
}

#[async_trait]
impl PostScraper for ApifyPostScraper {
    async fn scrape_post(&self, url: &str, cookies: Vec<SessionCookie>) -> Result<Vec<Value>> {
        self.client
            .scrape_post(&self.actor_id, url, cookies)
            .await
            .map_err(from_apify_error)
    }
}

/// Every scraper failure, parse failures included, is an upstream error on
/// the proof path.
fn from_apify_error(err: ApifyError) -> LeadSignalError {
    LeadSignalError::upstream(err.status(), err.to_string())
}
