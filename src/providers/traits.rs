use anyhow::Result;
use async_trait::async_trait;

/// Seam between the web handlers and the upstream completion API.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a single system + user message pair and returns the model's
    /// text. Errors map to an upstream failure at the route boundary.
    async fn complete(&self, system_message: &str, prompt: &str) -> Result<String>;

    /// Name of the chat model requests are sent to.
    fn model(&self) -> &str;
}
