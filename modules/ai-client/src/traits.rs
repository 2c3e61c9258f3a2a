use async_trait::async_trait;

use crate::error::Result;

/// Fluent single-turn completion request: an optional system preamble plus
/// one user prompt.
#[async_trait]
pub trait PromptBuilder: Send + Sized {
    fn preamble(self, preamble: impl Into<String>) -> Self;
    fn temperature(self, temperature: f32) -> Self;
    fn max_tokens(self, max_tokens: u32) -> Self;
    /// Ask the provider for a bare JSON object. OpenAI-style providers reject
    /// the request unless some message contains the word "json".
    fn json_object(self) -> Self;
    /// Raw reply text of the first choice.
    async fn send(self) -> Result<String>;
}
