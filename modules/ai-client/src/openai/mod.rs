mod client;
pub mod prompt_builder;
pub(crate) mod types;

pub use prompt_builder::OpenAiPromptBuilder;

use client::{OpenAiClient, OPENAI_API_URL};

// =============================================================================
// OpenAi Agent
// =============================================================================

/// Handle to an OpenAI-compatible chat completions endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        OpenAiClient::new(&self.api_key, self.http.clone()).with_base_url(&self.base_url)
    }

    pub fn prompt(&self, input: impl Into<String>) -> OpenAiPromptBuilder {
        OpenAiPromptBuilder::new(self.clone(), input.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_creation() {
        let ai = OpenAi::new("test-key", "gpt-4o-mini");
        assert_eq!(ai.model(), "gpt-4o-mini");
        assert_eq!(ai.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_with_base_url() {
        let ai = OpenAi::new("test-key", "llama-3.1-8b-instant")
            .with_base_url("https://api.groq.com/openai/v1/");
        assert_eq!(ai.base_url(), "https://api.groq.com/openai/v1/");
    }
}
