//! Core logic including the turn executor, capability dispatch, and
//! session storage.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod capability;
pub mod conversation;
mod error;
mod executor;
mod model_client;
pub mod session;

pub use conversation::Conversation;
pub use error::{CancelPhase, TurnError};
pub use executor::{
    DEFAULT_MAX_STEPS, TurnExecutor, TurnExecutorBuilder, TurnOptions,
    TurnOutcome,
};
