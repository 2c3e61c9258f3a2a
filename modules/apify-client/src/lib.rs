pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{PostScraperInput, RunData, RunStatus, SessionCookie};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize + ?Sized>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient long-polling.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let resp = check_status(resp).await?;
            let api_resp: ApiResponse<RunData> = resp.json().await?;
            match RunStatus::from_api(&api_resp.data.status) {
                RunStatus::Succeeded => return Ok(api_resp.data),
                RunStatus::Failed => {
                    return Err(ApifyError::RunFailed {
                        run_id: api_resp.data.id,
                        status: api_resp.data.status,
                    });
                }
                RunStatus::Running => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Run an actor end-to-end: start run, poll, fetch results.
    pub async fn run_actor<I, T>(&self, actor_id: &str, input: &I) -> Result<Vec<T>>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let run = self.start_run(actor_id, input).await?;
        tracing::info!(actor_id, run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let items: Vec<T> = self.get_dataset_items(&completed.default_dataset_id).await?;
        tracing::info!(actor_id, count = items.len(), "Fetched dataset items");
        Ok(items)
    }

    /// Scrape a single post URL with a logged-in session.
    ///
    /// Items come back as raw JSON because post scraper actors disagree on
    /// field names; callers normalize them.
    pub async fn scrape_post(
        &self,
        actor_id: &str,
        post_url: &str,
        cookies: Vec<SessionCookie>,
    ) -> Result<Vec<serde_json::Value>> {
        tracing::info!(post_url, cookies = cookies.len(), "Starting post scrape");

        let input = PostScraperInput {
            urls: vec![post_url.to_string()],
            cookies,
        };
        self.run_actor(actor_id, &input).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApifyError::Api {
        status: status.as_u16(),
        message: body,
    })
}
