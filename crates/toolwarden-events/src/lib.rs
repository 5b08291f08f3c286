//! Toolwarden Events - Progress channel for governed tools.
//!
//! Every tool instance owns one [`ProgressChannel`], injected at
//! construction. The agent session that owns the tool subscribes
//! [`ProgressListener`]s to it and unsubscribes them when it is done; there is
//! no process-wide registry.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use toolwarden_events::{ProgressChannel, ProgressEvent, ProgressListener};
//!
//! let channel = ProgressChannel::new("workbench");
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let listener: Arc<dyn ProgressListener> = Arc::new(move |event: &ProgressEvent| {
//!     sink.lock().unwrap().push(event.message.clone());
//! });
//! channel.add_listener(Arc::clone(&listener));
//!
//! channel.publish("running cargo build");
//! assert_eq!(*seen.lock().unwrap(), vec!["running cargo build".to_string()]);
//!
//! channel.remove_listener(&listener);
//! assert_eq!(channel.publish("unheard"), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod channel;
mod event;

pub use channel::{ProgressChannel, ProgressListener};
pub use event::ProgressEvent;
