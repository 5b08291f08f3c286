//! Prelude module - commonly used types for convenient import.
//!
//! Use `use toolwarden_events::prelude::*;` to import all essential types.

pub use crate::{ProgressChannel, ProgressEvent, ProgressListener};
