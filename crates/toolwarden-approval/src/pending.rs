//! One-shot approval slot shared by a blocked caller and a decision thread.
//!
//! Each gated invocation owns exactly one [`PendingApproval`]. Its lifecycle:
//!
//! ```text
//! Created -> Awaiting -> { Approved | Denied } -> Consumed
//! ```
//!
//! A decision, a cancellation, and a deadline expiry all go through the same
//! settle step; only the first one to arrive takes effect. The blocked
//! caller waits on a condition variable, never polls.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use toolwarden_core::{ApprovalDecision, InvocationId};

/// Lifecycle state of a pending approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    /// Registered with the gateway, not yet presented.
    Created,
    /// Presented; the caller is (or is about to be) blocked.
    Awaiting,
    /// Settled as approved; not yet picked up by the caller.
    Approved,
    /// Settled as denied (by a human, cancellation, timeout, or channel failure).
    Denied,
    /// The caller has taken the decision. Final.
    Consumed,
}

impl ApprovalState {
    /// Check if the slot can still accept a decision.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Created | Self::Awaiting)
    }
}

struct Slot {
    state: ApprovalState,
    decision: Option<ApprovalDecision>,
}

/// A one-shot synchronization slot for a single invocation.
pub struct PendingApproval {
    id: InvocationId,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl PendingApproval {
    /// Create a slot; `timeout` starts counting now.
    #[must_use]
    pub fn new(id: InvocationId, timeout: Option<Duration>) -> Self {
        Self {
            id,
            timeout,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
            slot: Mutex::new(Slot {
                state: ApprovalState::Created,
                decision: None,
            }),
            ready: Condvar::new(),
        }
    }

    /// The invocation this slot belongs to.
    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ApprovalState {
        self.lock().state
    }

    /// Move `Created -> Awaiting`. No effect in any other state.
    pub fn mark_awaiting(&self) {
        let mut slot = self.lock();
        if slot.state == ApprovalState::Created {
            slot.state = ApprovalState::Awaiting;
        }
    }

    /// Settle the slot with `decision`.
    ///
    /// Returns `false` (and changes nothing) if the slot was already settled
    /// or consumed, or if the decision names a different invocation.
    pub fn fulfill(&self, decision: ApprovalDecision) -> bool {
        if decision.invocation_id != self.id {
            return false;
        }
        let mut slot = self.lock();
        let settled = settle(&mut slot, decision);
        drop(slot);
        if settled {
            self.ready.notify_all();
        }
        settled
    }

    /// Block until the slot is settled, then consume the decision.
    ///
    /// If the deadline passes first, the slot is settled as a timeout denial.
    /// A second call after consumption returns a denial; the decision is
    /// handed out once.
    pub fn wait(&self) -> ApprovalDecision {
        let mut slot = self.lock();
        if slot.state == ApprovalState::Created {
            slot.state = ApprovalState::Awaiting;
        }

        loop {
            match slot.state {
                ApprovalState::Approved | ApprovalState::Denied => {
                    slot.state = ApprovalState::Consumed;
                    return slot.decision.take().unwrap_or_else(|| {
                        ApprovalDecision::channel_failure(self.id, "decision missing from slot")
                    });
                },
                ApprovalState::Consumed => {
                    return ApprovalDecision::cancelled(self.id, "approval already consumed");
                },
                ApprovalState::Created | ApprovalState::Awaiting => {},
            }

            slot = match self.deadline {
                None => self
                    .ready
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        settle(&mut slot, self.timeout_decision());
                        continue;
                    }
                    self.ready
                        .wait_timeout(slot, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                },
            };
        }
    }

    fn timeout_decision(&self) -> ApprovalDecision {
        let waited = self.timeout.unwrap_or_default();
        ApprovalDecision::timed_out(
            self.id,
            format!("no decision within {}ms", waited.as_millis()),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panic while holding the lock cannot leave a half-written decision:
        // state and decision are assigned together in `settle`.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn settle(slot: &mut Slot, decision: ApprovalDecision) -> bool {
    if !slot.state.is_open() {
        return false;
    }
    slot.state = if decision.approved {
        ApprovalState::Approved
    } else {
        ApprovalState::Denied
    };
    slot.decision = Some(decision);
    true
}

impl std::fmt::Debug for PendingApproval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingApproval")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
