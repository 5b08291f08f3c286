//! Decision channels: how a pending invocation reaches a human.
//!
//! The gateway hands each gated invocation to its [`DecisionChannel`] as an
//! [`ApprovalPrompt`]. The channel may answer on any thread, at any later
//! time, through the prompt (or through `ApprovalGateway::resolve`).
//!
//! Two channels are provided:
//! - [`FnDecision`] adapts a plain `decide(description) -> bool` function and
//!   runs it on its own decision thread.
//! - [`PromptQueue`] forwards prompts to a UI thread that pulls them from a
//!   [`PromptReceiver`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use toolwarden_core::{ApprovalDecision, InvocationId, InvocationRequest, RiskTier};

use crate::error::{DecisionChannelError, DecisionChannelResult};
use crate::pending::PendingApproval;

/// Reason recorded when a decision function answers "no".
const DECLINED_REASON: &str = "declined by user";

/// Presents pending invocations to a human.
///
/// `present` must not block waiting for the answer; the gateway's caller is
/// already blocked. Returning an error denies the invocation.
pub trait DecisionChannel: Send + Sync {
    /// Hand a prompt to the human side.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt could not be delivered.
    fn present(&self, prompt: ApprovalPrompt) -> DecisionChannelResult<()>;
}

/// Handle that settles one pending invocation.
///
/// Holds only a weak reference: once the caller has resumed and the slot is
/// gone, resolving is a no-op.
#[derive(Clone)]
pub struct Resolver {
    id: InvocationId,
    slot: Weak<PendingApproval>,
}

impl Resolver {
    pub(crate) fn new(slot: &Arc<PendingApproval>) -> Self {
        Self {
            id: slot.id(),
            slot: Arc::downgrade(slot),
        }
    }

    /// Settle with an explicit decision. Returns `true` if it took effect.
    pub fn resolve(&self, decision: ApprovalDecision) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| slot.fulfill(decision))
    }

    /// Approve the invocation.
    pub fn approve(&self) -> bool {
        self.resolve(ApprovalDecision::approve(self.id))
    }

    /// Deny the invocation with a reason.
    pub fn deny(&self, reason: impl Into<String>) -> bool {
        self.resolve(ApprovalDecision::deny(self.id, reason))
    }

    /// Deny the invocation because the decision channel failed.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.resolve(ApprovalDecision::channel_failure(self.id, reason))
    }

    /// Check if the invocation is still waiting for a decision.
    ///
    /// `false` once it was settled (decided, cancelled, timed out) or the
    /// caller has moved on.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| slot.state().is_open())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").field("id", &self.id).finish()
    }
}

/// A rendered request for a human decision.
#[derive(Debug, Clone)]
pub struct ApprovalPrompt {
    /// The invocation awaiting a decision.
    pub invocation_id: InvocationId,
    /// Tool instance identity.
    pub tool: String,
    /// Operation name.
    pub operation: String,
    /// Resolved risk tier.
    pub tier: RiskTier,
    /// Human-readable description of the operation and its arguments.
    pub description: String,
    resolver: Resolver,
}

impl ApprovalPrompt {
    pub(crate) fn new(request: &InvocationRequest, resolver: Resolver) -> Self {
        Self {
            invocation_id: request.id,
            tool: request.tool.clone(),
            operation: request.descriptor.name.clone(),
            tier: request.descriptor.tier,
            description: request.describe(),
            resolver,
        }
    }

    /// The resolver for this prompt.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Approve the invocation.
    pub fn approve(&self) -> bool {
        self.resolver.approve()
    }

    /// Deny the invocation with a reason.
    pub fn deny(&self, reason: impl Into<String>) -> bool {
        self.resolver.deny(reason)
    }

    /// Settle with `approved`, using a generic reason for denials.
    pub fn answer(&self, approved: bool) -> bool {
        if approved {
            self.approve()
        } else {
            self.deny(DECLINED_REASON)
        }
    }
}

// ---------------------------------------------------------------------------
// FnDecision
// ---------------------------------------------------------------------------

/// Adapts a synchronous `decide(description) -> bool` function.
///
/// Each prompt is decided on a fresh thread, so the gateway can still time
/// out or cancel while the function is running. A panic inside the function
/// denies the invocation.
///
/// The decision thread is detached. A timeout or cancellation releases the
/// blocked caller but cannot stop `decide`: a function that never returns
/// keeps its thread alive for the life of the process. Use a
/// [`PromptQueue`] when the UI may abandon prompts.
pub struct FnDecision<F> {
    decide: Arc<F>,
}

impl<F> FnDecision<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    /// Wrap a decision function.
    pub fn new(decide: F) -> Self {
        Self {
            decide: Arc::new(decide),
        }
    }
}

impl<F> DecisionChannel for FnDecision<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn present(&self, prompt: ApprovalPrompt) -> DecisionChannelResult<()> {
        let decide = Arc::clone(&self.decide);
        thread::Builder::new()
            .name("toolwarden-decision".to_owned())
            .spawn(move || {
                match catch_unwind(AssertUnwindSafe(|| decide(&prompt.description))) {
                    Ok(approved) => {
                        if !prompt.answer(approved) {
                            debug!(invocation = %prompt.invocation_id, "Decision arrived after settlement");
                        }
                    },
                    Err(_) => {
                        warn!(invocation = %prompt.invocation_id, "Decision function panicked");
                        prompt.resolver.fail("decision function panicked");
                    },
                }
            })?;
        Ok(())
    }
}

impl<F> std::fmt::Debug for FnDecision<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDecision").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PromptQueue
// ---------------------------------------------------------------------------

/// A queued prompt that denies its invocation if dropped undelivered.
struct Queued(Option<ApprovalPrompt>);

impl Queued {
    fn take(mut self) -> Option<ApprovalPrompt> {
        self.0.take()
    }
}

impl Drop for Queued {
    fn drop(&mut self) {
        if let Some(prompt) = self.0.take() {
            prompt
                .resolver
                .fail("prompt queue closed before a decision was made");
        }
    }
}

/// Decision channel that queues prompts for a UI thread.
#[derive(Clone)]
pub struct PromptQueue {
    sender: mpsc::UnboundedSender<Queued>,
}

/// Receiving end of a [`PromptQueue`].
///
/// Prompts whose invocation was settled while queued (cancelled, timed out)
/// are skipped by every `recv*` method. Dropping the receiver denies every
/// prompt still queued.
pub struct PromptReceiver {
    receiver: mpsc::UnboundedReceiver<Queued>,
}

impl PromptQueue {
    /// Create a queue and its receiver.
    #[must_use]
    pub fn new() -> (Self, PromptReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, PromptReceiver { receiver })
    }
}

impl DecisionChannel for PromptQueue {
    fn present(&self, prompt: ApprovalPrompt) -> DecisionChannelResult<()> {
        self.sender
            .send(Queued(Some(prompt)))
            .map_err(|_| DecisionChannelError::Closed)
    }
}

impl PromptReceiver {
    /// Block the current thread until the next open prompt arrives.
    ///
    /// Returns `None` once every [`PromptQueue`] handle is dropped. Must not
    /// be called from within an async runtime; use [`recv`](Self::recv)
    /// there.
    pub fn recv_blocking(&mut self) -> Option<ApprovalPrompt> {
        loop {
            if let Some(prompt) = open(self.receiver.blocking_recv()?) {
                return Some(prompt);
            }
        }
    }

    /// Wait asynchronously for the next open prompt.
    pub async fn recv(&mut self) -> Option<ApprovalPrompt> {
        loop {
            if let Some(prompt) = open(self.receiver.recv().await?) {
                return Some(prompt);
            }
        }
    }

    /// Take the next open prompt if one is already queued.
    pub fn try_recv(&mut self) -> Option<ApprovalPrompt> {
        while let Ok(queued) = self.receiver.try_recv() {
            if let Some(prompt) = open(queued) {
                return Some(prompt);
            }
        }
        None
    }
}

fn open(queued: Queued) -> Option<ApprovalPrompt> {
    let prompt = queued.take()?;
    if prompt.resolver.is_open() {
        Some(prompt)
    } else {
        debug!(invocation = %prompt.invocation_id, "Skipping prompt for settled invocation");
        None
    }
}

impl std::fmt::Debug for PromptQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptQueue")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl std::fmt::Debug for PromptReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptReceiver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use toolwarden_core::{DecisionOrigin, OperationDescriptor};

    fn request() -> InvocationRequest {
        let descriptor = OperationDescriptor::new("Workbench", "write_file")
            .with_display_name("Write File")
            .with_parameters(["path"])
            .with_tier(RiskTier::Sensitive);
        InvocationRequest::new(
            "workbench",
            Arc::new(descriptor),
            vec![serde_json::json!("a.txt")],
        )
    }

    fn slot_for(request: &InvocationRequest) -> Arc<PendingApproval> {
        Arc::new(PendingApproval::new(request.id, Some(Duration::from_secs(5))))
    }

    #[test]
    fn test_prompt_carries_rendered_description() {
        let request = request();
        let slot = slot_for(&request);
        let prompt = ApprovalPrompt::new(&request, Resolver::new(&slot));
        assert_eq!(prompt.operation, "write_file");
        assert_eq!(prompt.tier, RiskTier::Sensitive);
        assert!(prompt.description.contains("path = \"a.txt\""));
    }

    #[test]
    fn test_resolver_after_slot_dropped() {
        let request = request();
        let slot = slot_for(&request);
        let resolver = Resolver::new(&slot);
        drop(slot);
        assert!(!resolver.approve());
    }

    #[test]
    fn test_answer_false_uses_declined_reason() {
        let request = request();
        let slot = slot_for(&request);
        let prompt = ApprovalPrompt::new(&request, Resolver::new(&slot));
        assert!(prompt.answer(false));
        let decision = slot.wait();
        assert_eq!(decision.reason.as_deref(), Some(DECLINED_REASON));
    }

    #[test]
    fn test_fn_decision_runs_decide() {
        let request = request();
        let slot = slot_for(&request);
        let channel = FnDecision::new(|description: &str| description.contains("a.txt"));
        channel
            .present(ApprovalPrompt::new(&request, Resolver::new(&slot)))
            .unwrap();
        assert!(slot.wait().is_approved());
    }

    #[test]
    fn test_fn_decision_panic_denies() {
        let request = request();
        let slot = slot_for(&request);
        let channel = FnDecision::new(|_: &str| -> bool { panic!("ui crashed") });
        channel
            .present(ApprovalPrompt::new(&request, Resolver::new(&slot)))
            .unwrap();

        let decision = slot.wait();
        assert!(!decision.is_approved());
        assert_eq!(decision.origin, DecisionOrigin::ChannelFailure);
    }

    #[test]
    fn test_prompt_queue_delivers() {
        let request = request();
        let slot = slot_for(&request);
        let (queue, mut receiver) = PromptQueue::new();
        queue
            .present(ApprovalPrompt::new(&request, Resolver::new(&slot)))
            .unwrap();

        let prompt = receiver.try_recv().unwrap();
        assert_eq!(prompt.invocation_id, request.id);
        assert!(prompt.approve());
        assert!(slot.wait().is_approved());
    }

    #[test]
    fn test_prompt_queue_closed() {
        let request = request();
        let slot = slot_for(&request);
        let (queue, receiver) = PromptQueue::new();
        drop(receiver);

        let result = queue.present(ApprovalPrompt::new(&request, Resolver::new(&slot)));
        assert!(matches!(result, Err(DecisionChannelError::Closed)));
        assert_eq!(slot.wait().origin, DecisionOrigin::ChannelFailure);
    }

    #[test]
    fn test_settled_prompts_are_skipped() {
        let stale_request = request();
        let stale = slot_for(&stale_request);
        let live_request = request();
        let live = slot_for(&live_request);
        let (queue, mut receiver) = PromptQueue::new();
        queue
            .present(ApprovalPrompt::new(&stale_request, Resolver::new(&stale)))
            .unwrap();
        queue
            .present(ApprovalPrompt::new(&live_request, Resolver::new(&live)))
            .unwrap();

        assert!(stale.fulfill(ApprovalDecision::cancelled(stale_request.id, "interrupted")));

        let prompt = receiver.try_recv().unwrap();
        assert_eq!(prompt.invocation_id, live_request.id);
        assert!(prompt.resolver().is_open());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_resolver_closed_after_slot_dropped() {
        let request = request();
        let slot = slot_for(&request);
        let resolver = Resolver::new(&slot);
        assert!(resolver.is_open());
        drop(slot);
        assert!(!resolver.is_open());
    }

    #[test]
    fn test_dropping_receiver_denies_queued_prompts() {
        let request = request();
        let slot = slot_for(&request);
        let (queue, receiver) = PromptQueue::new();
        queue
            .present(ApprovalPrompt::new(&request, Resolver::new(&slot)))
            .unwrap();
        drop(receiver);

        let decision = slot.wait();
        assert!(!decision.is_approved());
        assert_eq!(decision.origin, DecisionOrigin::ChannelFailure);
    }
}
