//! Mock approvers and listeners.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use toolwarden_approval::Approver;
use toolwarden_core::{ApprovalDecision, InvocationRequest};
use toolwarden_events::{ProgressEvent, ProgressListener};

/// Approver that panics if it is ever consulted.
///
/// Wrap a tool with it to prove that an operation is forwarded without
/// approval.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForbiddenApprover;

impl Approver for ForbiddenApprover {
    fn submit(&self, request: InvocationRequest) -> ApprovalDecision {
        panic!(
            "approval requested for '{}' which must not be gated",
            request.operation()
        );
    }
}

/// Approver that answers from a queue of scripted verdicts.
///
/// `Some(reason)` denies with that reason, `None` approves. When the queue
/// is empty every request is denied. All requests are recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApprover {
    verdicts: Arc<Mutex<VecDeque<Option<String>>>>,
    requests: Arc<Mutex<Vec<InvocationRequest>>>,
}

impl ScriptedApprover {
    /// Create an approver with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an approval.
    #[must_use]
    pub fn approving(self) -> Self {
        if let Ok(mut guard) = self.verdicts.lock() {
            guard.push_back(None);
        }
        self
    }

    /// Queue a denial.
    #[must_use]
    pub fn denying(self, reason: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.verdicts.lock() {
            guard.push_back(Some(reason.into()));
        }
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Approver for ScriptedApprover {
    fn submit(&self, request: InvocationRequest) -> ApprovalDecision {
        let id = request.id;
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
        let verdict = self
            .verdicts
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front());
        match verdict {
            Some(None) => ApprovalDecision::approve(id),
            Some(Some(reason)) => ApprovalDecision::deny(id, reason),
            None => ApprovalDecision::deny(id, "script exhausted"),
        }
    }
}

/// Listener that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingListener {
    /// Create a shared recording listener.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Messages received, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|guard| guard.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Events received, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ProgressListener for RecordingListener {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
