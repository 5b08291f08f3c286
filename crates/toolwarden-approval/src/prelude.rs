//! Prelude module - commonly used types for convenient import.
//!
//! Use `use toolwarden_approval::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalGateway, ApprovalPrompt, Approver, DecisionChannel, DecisionChannelError,
    FnDecision, PromptQueue, PromptReceiver,
};
