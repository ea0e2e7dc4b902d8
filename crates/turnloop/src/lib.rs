//! An out-of-the-box conversational turn loop that wires a session
//! store to a turn executor.
//!
//! The crate exposes a [`Chat`] facade: callers hand it a session
//! identifier and a user message, and it retrieves the prior
//! conversation, runs the model/capability loop, and appends the full
//! exchange back to the store.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod chat;

pub use chat::{Chat, ChatBuilder, ChatError};

/// Re-exports of [`turnloop_core`] crate.
pub mod core {
    pub use turnloop_core::*;
}

/// Re-exports of [`turnloop_model`] crate.
pub mod model {
    pub use turnloop_model::*;
}
