use async_trait::async_trait;
use tracing::warn;

use crate::error::{AiError, Result};
use crate::traits::PromptBuilder;

use super::types::*;
use super::OpenAi;

pub struct OpenAiPromptBuilder {
    agent: OpenAi,
    input: String,
    preamble: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    json_object: bool,
}

impl OpenAiPromptBuilder {
    pub(crate) fn new(agent: OpenAi, input: String) -> Self {
        Self {
            agent,
            input,
            preamble: None,
            temperature: None,
            max_tokens: None,
            json_object: false,
        }
    }

    pub(crate) fn build_request(&self) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(ref preamble) = self.preamble {
            messages.push(WireMessage::system(preamble));
        }

        if !self.input.is_empty() {
            messages.push(WireMessage::user(&self.input));
        }

        let mut request = ChatRequest::new(&self.agent.model).messages(messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        if self.json_object {
            request.response_format = Some(ResponseFormat::json_object());
        }
        request
    }
}

#[async_trait]
impl PromptBuilder for OpenAiPromptBuilder {
    fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    async fn send(self) -> Result<String> {
        let request = self.build_request();

        if request.response_format.is_some() && !request.mentions_json() {
            warn!(model = %request.model, "JSON mode requested but no message mentions json");
        }

        let response = self.agent.client().chat(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Empty("no choices in response".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!(model = %request.model, "Completion truncated at max_tokens");
        }

        choice
            .message
            .content
            .ok_or_else(|| AiError::Empty("choice has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_puts_preamble_before_input() {
        let builder = OpenAi::new("sk-test", "gpt-4o-mini")
            .prompt("Evaluate this lead")
            .preamble("You only answer in json")
            .temperature(0.1)
            .max_tokens(1000)
            .json_object();

        let request = builder.build_request();
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert!(request.mentions_json());
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
    }

    #[test]
    fn empty_input_adds_no_user_message() {
        let request = OpenAi::new("k", "m").prompt("").preamble("sys").build_request();
        assert_eq!(request.messages.len(), 1);
        assert!(request.response_format.is_none());
    }
}
