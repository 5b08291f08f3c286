//! Mock model providers and agent bindings.
//!
//! [`MockLlmProvider`] replays scripted completion turns. [`StubBinding`]
//! short-circuits the model entirely and reports canned tool invocations,
//! which is what the capability probe scenarios need.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use toolwarden_llm::{
    AgentBinding, AgentRequest, AgentTurn, EmittedInvocation, LlmError, LlmProvider, LlmResponse,
    LlmResult, LlmToolDefinition, Message, ToolCall, ToolCallResult,
};

// ---------------------------------------------------------------------------
// MockLlmProvider
// ---------------------------------------------------------------------------

/// A single scripted turn the mock provider replays.
#[derive(Debug, Clone)]
pub enum MockLlmTurn {
    /// A text response.
    Text(String),
    /// Tool calls by name; arguments are empty objects.
    ToolCalls(Vec<String>),
    /// Produce an error.
    Error(String),
}

/// Deterministic, queue-based [`LlmProvider`].
///
/// Each `complete` pops the next turn. An exhausted script yields an error.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    turns: Mutex<VecDeque<MockLlmTurn>>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl MockLlmProvider {
    /// Create a provider replaying `turns` in order.
    #[must_use]
    pub fn new(turns: Vec<MockLlmTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            offered: Mutex::new(Vec::new()),
        }
    }

    /// Tool names offered on each request so far.
    #[must_use]
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of completion requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.offered.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<LlmResponse> {
        if let Ok(mut guard) = self.offered.lock() {
            guard.push(tools.iter().map(|t| t.name.clone()).collect());
        }
        let turn = self
            .turns
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front());

        match turn {
            Some(MockLlmTurn::Text(text)) => Ok(LlmResponse::text(text)),
            Some(MockLlmTurn::ToolCalls(names)) => Ok(LlmResponse::tool_use(
                names
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| ToolCall::new(format!("call-{i}"), name))
                    .collect(),
            )),
            Some(MockLlmTurn::Error(message)) => Err(LlmError::ApiRequestFailed(message)),
            None => Err(LlmError::InvalidResponse("mock script exhausted".to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// StubBinding
// ---------------------------------------------------------------------------

/// How a [`StubBinding`] behaves.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Call every offered tool through the executor.
    InvokeTools,
    /// Answer in text without calling anything.
    NeverInvoke,
    /// Claim to have called every offered tool, reporting this result.
    ReportResult(String),
    /// Fail the request.
    Fail(String),
    /// Panic inside the request.
    Panic,
}

/// An [`AgentBinding`] with canned behavior that counts its requests.
#[derive(Debug)]
pub struct StubBinding {
    behavior: StubBehavior,
    requests: AtomicUsize,
}

impl StubBinding {
    /// Create a stub.
    #[must_use]
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of turns requested so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentBinding for StubBinding {
    async fn run_turn(&self, request: AgentRequest) -> LlmResult<AgentTurn> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let invocations = match &self.behavior {
            StubBehavior::InvokeTools => request
                .tools
                .iter()
                .map(|def| {
                    let call = ToolCall::new("stub-call", def.name.as_str());
                    EmittedInvocation::new(def.name.as_str(), request.executor.execute(&call))
                })
                .collect(),
            StubBehavior::NeverInvoke => Vec::new(),
            StubBehavior::ReportResult(result) => request
                .tools
                .iter()
                .map(|def| {
                    EmittedInvocation::new(
                        def.name.as_str(),
                        ToolCallResult::success("stub-call", result.as_str()),
                    )
                })
                .collect(),
            StubBehavior::Fail(message) => {
                return Err(LlmError::ApiRequestFailed(message.clone()));
            },
            StubBehavior::Panic => panic!("stub binding exploded"),
        };
        Ok(AgentTurn {
            invocations,
            text: Some("done".to_owned()),
        })
    }
}
