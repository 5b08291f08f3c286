//! Agent bindings: one request/response cycle with tool execution.
//!
//! An [`AgentBinding`] is whatever runs a single agent turn: it sends a
//! prompt with a set of tool definitions, executes every tool call the model
//! emits through the supplied [`ToolExecutor`], and reports which calls were
//! made and what they returned.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::provider::LlmProvider;
use crate::types::{LlmToolDefinition, Message, ToolCall, ToolCallResult};

/// Executes tool calls emitted by a model.
///
/// Execution is synchronous: a governed call may block its thread while a
/// human decides.
pub trait ToolExecutor: Send + Sync {
    /// Run one call and produce the result reported to the model.
    fn execute(&self, call: &ToolCall) -> ToolCallResult;
}

impl<F> ToolExecutor for F
where
    F: Fn(&ToolCall) -> ToolCallResult + Send + Sync,
{
    fn execute(&self, call: &ToolCall) -> ToolCallResult {
        self(call)
    }
}

/// One agent turn to run.
#[derive(Clone)]
pub struct AgentRequest {
    /// System instruction.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Tools the model may call.
    pub tools: Vec<LlmToolDefinition>,
    /// Executes the calls the model emits.
    pub executor: Arc<dyn ToolExecutor>,
}

impl AgentRequest {
    /// Create a request.
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        tools: Vec<LlmToolDefinition>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            tools,
            executor,
        }
    }
}

impl std::fmt::Debug for AgentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRequest")
            .field("system", &self.system)
            .field("prompt", &self.prompt)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

/// A tool invocation the model actually emitted during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedInvocation {
    /// Operation name the model called.
    pub name: String,
    /// What the call returned.
    pub result: ToolCallResult,
}

impl EmittedInvocation {
    /// Create a record.
    pub fn new(name: impl Into<String>, result: ToolCallResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

/// Outcome of one agent turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentTurn {
    /// Invocations in the order they were emitted.
    pub invocations: Vec<EmittedInvocation>,
    /// Final assistant text, if any.
    pub text: Option<String>,
}

/// Runs a single agent turn.
#[async_trait]
pub trait AgentBinding: Send + Sync {
    /// Send `request` once and report the invocations the model emitted.
    async fn run_turn(&self, request: AgentRequest) -> LlmResult<AgentTurn>;
}

#[async_trait]
impl<B: AgentBinding + ?Sized> AgentBinding for Arc<B> {
    async fn run_turn(&self, request: AgentRequest) -> LlmResult<AgentTurn> {
        (**self).run_turn(request).await
    }
}

/// Adapts a completion-style [`LlmProvider`] into an [`AgentBinding`].
///
/// Sends exactly one completion request, then executes each emitted tool
/// call on the blocking thread pool.
#[derive(Debug)]
pub struct ProviderBinding<P> {
    provider: P,
}

impl<P: LlmProvider> ProviderBinding<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LlmProvider> AgentBinding for ProviderBinding<P> {
    async fn run_turn(&self, request: AgentRequest) -> LlmResult<AgentTurn> {
        let messages = vec![Message::user(request.prompt.as_str())];
        let response = self
            .provider
            .complete(&messages, &request.tools, &request.system)
            .await?;

        let calls = response.message.tool_calls().map(<[ToolCall]>::to_vec).unwrap_or_default();
        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            calls = calls.len(),
            "Agent turn completed"
        );

        let mut invocations = Vec::with_capacity(calls.len());
        for call in calls {
            let executor = Arc::clone(&request.executor);
            let name = call.name.clone();
            let result = tokio::task::spawn_blocking(move || executor.execute(&call))
                .await
                .map_err(|e| LlmError::ToolExecutionFailed(e.to_string()))?;
            invocations.push(EmittedInvocation::new(name, result));
        }

        Ok(AgentTurn {
            invocations,
            text: response.message.text().map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LlmResponse;
    use std::sync::Mutex;

    struct CannedProvider {
        response: LlmResponse,
        seen_system: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            system: &str,
        ) -> LlmResult<LlmResponse> {
            self.seen_system.lock().unwrap().push(system.to_owned());
            Ok(self.response.clone())
        }
    }

    fn echo_executor() -> Arc<dyn ToolExecutor> {
        Arc::new(|call: &ToolCall| ToolCallResult::success(call.id.clone(), call.name.clone()))
    }

    #[tokio::test]
    async fn test_provider_binding_executes_calls() {
        let provider = CannedProvider {
            response: LlmResponse::tool_use(vec![
                ToolCall::new("c1", "read_status"),
                ToolCall::new("c2", "run_build"),
            ]),
            seen_system: Mutex::new(Vec::new()),
        };
        let binding = ProviderBinding::new(provider);

        let turn = binding
            .run_turn(AgentRequest::new("sys", "go", vec![], echo_executor()))
            .await
            .unwrap();

        let names: Vec<_> = turn.invocations.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["read_status", "run_build"]);
        assert_eq!(turn.invocations[1].result.content, "run_build");
        assert_eq!(*binding.provider().seen_system.lock().unwrap(), vec!["sys".to_owned()]);
    }

    #[tokio::test]
    async fn test_provider_binding_text_only() {
        let binding = ProviderBinding::new(CannedProvider {
            response: LlmResponse::text("I would rather not."),
            seen_system: Mutex::new(Vec::new()),
        });
        let turn = binding
            .run_turn(AgentRequest::new("", "go", vec![], echo_executor()))
            .await
            .unwrap();
        assert!(turn.invocations.is_empty());
        assert_eq!(turn.text.as_deref(), Some("I would rather not."));
    }
}
