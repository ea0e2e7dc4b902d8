//! Conversation-related types.

use serde::{Deserialize, Serialize};
use turnloop_model::ModelMessage;

/// Represents a conversation: an ordered sequence of messages, keyed
/// elsewhere by a session identifier.
///
/// Invariant: every capability-result message answers exactly one
/// invocation requested by a preceding assistant message in the same
/// conversation.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages of this conversation, in order.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the number of messages in this conversation.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if this conversation has no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message to this conversation.
    #[inline]
    pub fn push(&mut self, msg: ModelMessage) {
        self.messages.push(msg);
    }

    /// Appends multiple messages to this conversation.
    #[inline]
    pub fn extend<I: IntoIterator<Item = ModelMessage>>(&mut self, iter: I) {
        self.messages.extend(iter);
    }

    /// Returns the identifiers of invocation requests that have not yet
    /// received a matching result.
    pub fn unresolved_invocations(&self) -> Vec<&str> {
        let mut pending: Vec<&str> = Vec::new();
        for msg in &self.messages {
            match msg {
                ModelMessage::Assistant(assistant) => {
                    pending.extend(
                        assistant.invocations.iter().map(|inv| inv.id.as_str()),
                    );
                }
                ModelMessage::CapabilityResult(result) => {
                    pending.retain(|id| *id != result.responds_to);
                }
                _ => {}
            }
        }
        pending
    }
}

impl From<Vec<ModelMessage>> for Conversation {
    #[inline]
    fn from(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use turnloop_model::{
        AssistantMessage, InvocationRequest, InvocationResult, ModelMessage,
    };

    use super::*;

    #[test]
    fn test_unresolved_invocations() {
        let mut conversation = Conversation::new();
        conversation.push(ModelMessage::user("Check the weather"));
        conversation.push(ModelMessage::Assistant(AssistantMessage {
            content: String::new(),
            invocations: vec![
                InvocationRequest {
                    id: "inv:1".to_owned(),
                    capability: "get_current_weather".to_owned(),
                    arguments: json!({ "location": "SF" }),
                },
                InvocationRequest {
                    id: "inv:2".to_owned(),
                    capability: "get_current_weather".to_owned(),
                    arguments: json!({ "location": "NYC" }),
                },
            ],
        }));
        assert_eq!(conversation.unresolved_invocations(), ["inv:1", "inv:2"]);

        conversation.push(ModelMessage::CapabilityResult(InvocationResult {
            responds_to: "inv:1".to_owned(),
            content: "Sunny".to_owned(),
        }));
        assert_eq!(conversation.unresolved_invocations(), ["inv:2"]);

        conversation.push(ModelMessage::CapabilityResult(InvocationResult {
            responds_to: "inv:2".to_owned(),
            content: "Rainy".to_owned(),
        }));
        assert!(conversation.unresolved_invocations().is_empty());
    }
}
