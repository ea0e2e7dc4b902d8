use serde::{Deserialize, Serialize};
use turnloop_model::InvocationRequest;

/// The events in a scripted response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ScriptEvent {
    /// A chunk of assistant text.
    #[serde(rename = "content_delta")]
    ContentDelta(String),
    /// A capability invocation request.
    #[serde(rename = "invocation")]
    Invocation(InvocationRequest),
}

/// A scripted response for one assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptedResponse {
    /// Events in this response.
    pub events: Vec<ScriptEvent>,
}

impl ScriptedResponse {
    /// Creates a `ScriptedResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<ScriptEvent>>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Creates a `ScriptedResponse` that delivers the given text as a
    /// single chunk.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            events: vec![ScriptEvent::ContentDelta(text.into())],
        }
    }
}
