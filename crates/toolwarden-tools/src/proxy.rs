//! Interception proxy.
//!
//! [`Governed`] wraps a tool and exposes the same operations. Every call is
//! resolved against the tool type's declared operations, then admitted by
//! tier:
//!
//! - `Safe` / `Interactive`: forwarded immediately
//! - `Sensitive` / `Unknown`: submitted to the [`Approver`] and forwarded only
//!   on approval; otherwise a [`Rejection`] is returned and the tool never runs
//!
//! Equality, hashing, and formatting forward to the wrapped tool ungated.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use toolwarden_approval::Approver;
use toolwarden_core::{InvocationRequest, OperationDescriptor};
use toolwarden_events::ProgressListener;
use toolwarden_llm::{LlmToolDefinition, ToolCall, ToolCallResult};
use tracing::{debug, field, info, info_span, warn};

use crate::error::{InvocationError, InvocationResult, Rejection, ToolError};
use crate::policy::{Admission, PolicyClassifier};
use crate::registry::{Arguments, GovernedTool, OperationRegistry, OperationSet};

/// A tool whose operations pass through risk admission.
pub struct Governed<T: GovernedTool> {
    tool: T,
    operations: Arc<OperationSet<T>>,
    approver: Arc<dyn Approver>,
}

impl<T: GovernedTool> Governed<T> {
    /// Wrap `tool`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Configuration`] if `T`'s operation
    /// declarations are invalid.
    pub fn new(
        tool: T,
        registry: &OperationRegistry,
        approver: Arc<dyn Approver>,
    ) -> InvocationResult<Self> {
        let operations = registry.operations::<T>()?;
        Ok(Self {
            tool,
            operations,
            approver,
        })
    }

    /// Identity of the wrapped tool instance.
    pub fn tool_name(&self) -> &str {
        self.tool.tool_name()
    }

    /// Descriptors of every declared operation, in declaration order.
    pub fn operations(&self) -> &[Arc<OperationDescriptor>] {
        self.operations.descriptors()
    }

    /// Invoke `operation` with positional `arguments`.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::NotRegistered`] for an undeclared operation
    /// - [`InvocationError::Arity`] for a wrong argument count
    /// - [`InvocationError::Rejected`] if approval was not granted
    /// - [`InvocationError::Operation`] if the tool itself failed
    pub fn invoke(&self, operation: &str, arguments: Vec<Value>) -> InvocationResult<Value> {
        let Some((descriptor, handler)) = self.operations.find(operation) else {
            warn!(
                tool = %self.tool.tool_name(),
                operation,
                "Invocation of undeclared operation refused"
            );
            return Err(self.operations.not_registered(operation));
        };

        if arguments.len() != descriptor.arity() {
            return Err(InvocationError::Arity {
                operation: operation.to_owned(),
                expected: descriptor.arity(),
                actual: arguments.len(),
            });
        }

        let span = info_span!(
            "governed_invoke",
            tool = %self.tool.tool_name(),
            operation,
            tier = %descriptor.tier,
            invocation = field::Empty,
        );
        let _guard = span.enter();

        match PolicyClassifier::admission(descriptor.tier) {
            Admission::Forward => {
                debug!("Forwarding without approval");
            },
            Admission::RequireApproval => {
                let request = InvocationRequest::new(
                    self.tool.tool_name(),
                    Arc::clone(descriptor),
                    arguments.clone(),
                );
                span.record("invocation", field::display(request.id));

                let decision = self.approver.submit(request);
                if !decision.is_approved() {
                    info!(
                        origin = ?decision.origin,
                        reason = decision.reason_or_default(),
                        "Invocation rejected"
                    );
                    return Err(Rejection::from_decision(operation, arguments, &decision).into());
                }
                debug!("Approved, forwarding");
            },
        }

        handler(&self.tool, Arguments::new(Arc::clone(descriptor), arguments))
            .map_err(InvocationError::Operation)
    }

    /// Tool definitions for the model, one per declared operation.
    ///
    /// Parameters become required properties of an object schema.
    pub fn definitions(&self) -> Vec<LlmToolDefinition> {
        self.operations()
            .iter()
            .map(|descriptor| {
                let properties: Map<String, Value> = descriptor
                    .parameters
                    .iter()
                    .map(|p| (p.clone(), json!({})))
                    .collect();
                LlmToolDefinition::new(descriptor.name.as_str())
                    .with_description(format!(
                        "{} (risk: {})",
                        descriptor.display_name, descriptor.tier
                    ))
                    .with_schema(json!({
                        "type": "object",
                        "properties": properties,
                        "required": descriptor.parameters,
                    }))
            })
            .collect()
    }

    /// Invoke a model-issued call through the governed path.
    ///
    /// Named arguments are mapped to the declared parameter order. Any
    /// failure, including a rejection, becomes an error result.
    pub fn invoke_call(&self, call: &ToolCall) -> ToolCallResult {
        let outcome = self
            .positional_arguments(call)
            .and_then(|arguments| self.invoke(&call.name, arguments));
        match outcome {
            Ok(Value::String(text)) => ToolCallResult::success(call.id.as_str(), text),
            Ok(value) => ToolCallResult::success(call.id.as_str(), value.to_string()),
            Err(e) => ToolCallResult::error(call.id.as_str(), e.to_string()),
        }
    }

    fn positional_arguments(&self, call: &ToolCall) -> InvocationResult<Vec<Value>> {
        let Some((descriptor, _)) = self.operations.find(&call.name) else {
            return Err(self.operations.not_registered(&call.name));
        };

        let mut named = match &call.arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "expected an object of named arguments, got {other}"
                ))
                .into());
            },
        };

        let mut positional = Vec::with_capacity(descriptor.arity());
        for parameter in &descriptor.parameters {
            match named.remove(parameter) {
                Some(value) => positional.push(value),
                None => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing argument '{parameter}'"
                    ))
                    .into());
                },
            }
        }
        if let Some(extra) = named.keys().next() {
            return Err(ToolError::InvalidArguments(format!(
                "unexpected argument '{extra}'"
            ))
            .into());
        }
        Ok(positional)
    }

    /// Subscribe to the tool's progress. Returns `false` if the tool has no
    /// progress channel or the listener is already subscribed.
    pub fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> bool {
        self.tool
            .progress()
            .is_some_and(|channel| channel.add_listener(listener))
    }

    /// Unsubscribe from the tool's progress.
    pub fn remove_listener(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.tool
            .progress()
            .is_some_and(|channel| channel.remove_listener(listener))
    }
}

impl<T: GovernedTool + PartialEq> PartialEq for Governed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.tool == other.tool
    }
}

impl<T: GovernedTool + Eq> Eq for Governed<T> {}

impl<T: GovernedTool + Hash> Hash for Governed<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tool.hash(state);
    }
}

impl<T: GovernedTool + fmt::Display> fmt::Display for Governed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tool.fmt(f)
    }
}

impl<T: GovernedTool + fmt::Debug> fmt::Debug for Governed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tool.fmt(f)
    }
}
