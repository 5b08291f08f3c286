//! Approval gateway: blocks a caller until a human decision arrives.
//!
//! # Flow
//!
//! 1. Register a [`PendingApproval`] for the invocation id
//! 2. Present an [`ApprovalPrompt`] through the configured [`DecisionChannel`]
//! 3. Block on the slot until a decision, cancellation, or timeout settles it
//! 4. Drop the slot and hand the decision back
//!
//! Every failure on the way (no channel, channel error, channel panic,
//! duplicate id) settles the invocation as denied.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use toolwarden_config::ApprovalSection;
use toolwarden_core::{ApprovalDecision, InvocationId, InvocationRequest};
use tracing::{debug, info, warn};

use crate::channel::{ApprovalPrompt, DecisionChannel, Resolver};
use crate::pending::PendingApproval;

/// Default approval timeout (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Anything that can turn an invocation request into a decision.
///
/// The interception proxy depends on this trait rather than on
/// [`ApprovalGateway`] directly.
pub trait Approver: Send + Sync {
    /// Block until `request` is decided.
    fn submit(&self, request: InvocationRequest) -> ApprovalDecision;
}

impl<A: Approver + ?Sized> Approver for Arc<A> {
    fn submit(&self, request: InvocationRequest) -> ApprovalDecision {
        (**self).submit(request)
    }
}

/// Blocks gated invocations until a human decision resolves them.
///
/// Each in-flight invocation has its own slot; unrelated invocations never
/// wait on each other.
pub struct ApprovalGateway {
    channel: Option<Arc<dyn DecisionChannel>>,
    timeout: Option<Duration>,
    pending: DashMap<InvocationId, Arc<PendingApproval>>,
}

impl ApprovalGateway {
    /// Create a gateway with no decision channel and the default timeout.
    ///
    /// Without a channel every submission is denied.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channel: None,
            timeout: Some(DEFAULT_TIMEOUT),
            pending: DashMap::new(),
        }
    }

    /// Create a gateway using the configured timeout.
    #[must_use]
    pub fn from_config(section: &ApprovalSection) -> Self {
        Self {
            timeout: section.timeout(),
            ..Self::new()
        }
    }

    /// Set the decision channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Arc<dyn DecisionChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Set the approval timeout. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The approval timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve the pending invocation `id` with `decision`.
    ///
    /// Returns `false` if no such invocation is pending, if it has already
    /// been settled, or if `decision` names a different invocation.
    pub fn resolve(&self, id: &InvocationId, decision: ApprovalDecision) -> bool {
        let Some(pending) = self.lookup(id) else {
            warn!(invocation = %id, "Decision for unknown or finished invocation ignored");
            return false;
        };
        let settled = pending.fulfill(decision);
        if !settled {
            warn!(invocation = %id, "Duplicate or mismatched decision ignored");
        }
        settled
    }

    /// Cancel one pending invocation. It is denied with `reason`.
    pub fn cancel(&self, id: &InvocationId, reason: &str) -> bool {
        let settled = self
            .lookup(id)
            .is_some_and(|pending| pending.fulfill(ApprovalDecision::cancelled(*id, reason)));
        if settled {
            info!(invocation = %id, reason, "Pending approval cancelled");
        }
        settled
    }

    /// Cancel every pending invocation. Returns how many were settled.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let snapshot: Vec<Arc<PendingApproval>> = self
            .pending
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let cancelled = snapshot
            .iter()
            .filter(|pending| pending.fulfill(ApprovalDecision::cancelled(pending.id(), reason)))
            .count();
        if cancelled > 0 {
            info!(cancelled, reason, "Pending approvals cancelled");
        }
        cancelled
    }

    /// Ids of invocations currently waiting for a decision.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<InvocationId> {
        self.pending.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of invocations currently waiting for a decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn lookup(&self, id: &InvocationId) -> Option<Arc<PendingApproval>> {
        self.pending.get(id).map(|entry| Arc::clone(entry.value()))
    }

    fn register(&self, id: InvocationId) -> Option<Arc<PendingApproval>> {
        match self.pending.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let pending = Arc::new(PendingApproval::new(id, self.timeout));
                vacant.insert(Arc::clone(&pending));
                Some(pending)
            },
        }
    }

    fn present(&self, request: &InvocationRequest, pending: &Arc<PendingApproval>) {
        let resolver = Resolver::new(pending);
        let Some(channel) = &self.channel else {
            warn!(invocation = %request.id, "No decision channel configured, denying");
            resolver.fail("no decision channel configured");
            return;
        };

        let prompt = ApprovalPrompt::new(request, resolver.clone());
        match catch_unwind(AssertUnwindSafe(|| channel.present(prompt))) {
            Ok(Ok(())) => {
                debug!(invocation = %request.id, "Approval prompt presented");
            },
            Ok(Err(e)) => {
                warn!(invocation = %request.id, error = %e, "Decision channel failed, denying");
                resolver.fail(e.to_string());
            },
            Err(_) => {
                warn!(invocation = %request.id, "Decision channel panicked, denying");
                resolver.fail("decision channel panicked");
            },
        }
    }
}

impl Approver for ApprovalGateway {
    fn submit(&self, request: InvocationRequest) -> ApprovalDecision {
        let id = request.id;
        let Some(pending) = self.register(id) else {
            warn!(invocation = %id, "Invocation id already pending, denying");
            return ApprovalDecision::deny(id, "invocation is already awaiting a decision");
        };

        info!(
            invocation = %id,
            tool = %request.tool,
            operation = %request.operation(),
            tier = %request.descriptor.tier,
            "Awaiting approval"
        );

        pending.mark_awaiting();
        self.present(&request, &pending);
        let decision = pending.wait();
        self.pending.remove(&id);

        info!(
            invocation = %id,
            approved = decision.approved,
            origin = ?decision.origin,
            reason = decision.reason.as_deref().unwrap_or(""),
            "Approval settled"
        );
        decision
    }
}

impl Default for ApprovalGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApprovalGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGateway")
            .field("has_channel", &self.channel.is_some())
            .field("timeout", &self.timeout)
            .field("pending", &self.pending.len())
            .finish()
    }
}
