//! Completion-style model client.
//!
//! Concrete HTTP clients live outside this workspace; they are adapted into
//! an agent turn by [`ProviderBinding`](crate::ProviderBinding).

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::types::{LlmResponse, LlmToolDefinition, Message};

/// A model that answers one message list with one response.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Model identifier, used in logs.
    fn model(&self) -> &str;

    /// Send `messages` with `tools` offered and wait for the full response.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse>;
}

/// Allows `Box<dyn LlmProvider>` wherever `P: LlmProvider` is required.
#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse> {
        (**self).complete(messages, tools, system).await
    }
}
