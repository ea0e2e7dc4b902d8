use std::error::Error as StdError;
use std::fmt::{self, Display};

use turnloop_model::{ModelMessage, ModelProviderError};

/// The phase a turn was in when it was cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelPhase {
    /// A model call was outstanding.
    ModelCall {
        /// 1-based index of the model call within the turn.
        step: usize,
    },
    /// A capability invocation was outstanding.
    Capability {
        /// Name of the capability.
        name: String,
        /// Identifier of the invocation request.
        invocation_id: String,
    },
}

impl Display for CancelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelPhase::ModelCall { step } => {
                write!(f, "model call (step {step})")
            }
            CancelPhase::Capability {
                name,
                invocation_id,
            } => {
                write!(f, "capability `{name}` ({invocation_id})")
            }
        }
    }
}

/// A fatal turn error.
///
/// Recoverable conditions (an unknown capability, a failing capability)
/// never surface here; they are converted into capability-result content
/// so the model can adapt.
#[derive(Debug)]
pub enum TurnError {
    /// The model provider could not serve a request. Nothing from this
    /// turn is appended to the session.
    ModelUnavailable {
        /// 1-based index of the failing model call within the turn.
        step: usize,
        /// The underlying provider error.
        source: Box<dyn ModelProviderError>,
    },
    /// The model provider refused a request. Nothing from this turn is
    /// appended to the session.
    ModelRejected {
        /// 1-based index of the failing model call within the turn.
        step: usize,
        /// The underlying provider error.
        source: Box<dyn ModelProviderError>,
    },
    /// The model-call budget was exhausted without the model producing
    /// a plain response.
    ExecutionLimitExceeded {
        /// All messages produced so far in this turn, for inspection.
        messages: Vec<ModelMessage>,
        /// The number of model calls that were made.
        model_calls: usize,
    },
    /// The caller-supplied deadline passed while a call was outstanding.
    /// The in-flight message is discarded.
    Cancelled {
        /// The phase the turn was in.
        phase: CancelPhase,
    },
}

impl Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::ModelUnavailable { step, source } => {
                write!(f, "model unavailable at step {step}: {source}")
            }
            TurnError::ModelRejected { step, source } => {
                write!(f, "model rejected the request at step {step}: {source}")
            }
            TurnError::ExecutionLimitExceeded { model_calls, .. } => {
                write!(
                    f,
                    "execution limit exceeded after {model_calls} model calls"
                )
            }
            TurnError::Cancelled { phase } => {
                write!(f, "turn cancelled during {phase}")
            }
        }
    }
}

impl StdError for TurnError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TurnError::ModelUnavailable { source, .. }
            | TurnError::ModelRejected { source, .. } => {
                Some(source.as_ref() as &(dyn StdError + 'static))
            }
            _ => None,
        }
    }
}
