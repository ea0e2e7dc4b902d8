use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// Capabilities that are available to the model.
    pub capabilities: Vec<CapabilityDecl>,
}

/// A complete message in a conversation.
///
/// Messages are immutable once created. A conversation is an ordered
/// sequence of them, and every capability-result message must answer
/// exactly one invocation requested by a preceding assistant message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ModelMessage {
    /// The system instructions.
    System {
        /// The instruction text.
        content: String,
    },
    /// A user input text.
    User {
        /// The input text.
        content: String,
    },
    /// An assistant message, possibly carrying invocation requests.
    Assistant(AssistantMessage),
    /// The result of a capability invocation.
    CapabilityResult(InvocationResult),
}

impl ModelMessage {
    /// Creates a user message from the given text.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a system message from the given text.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::System {
            content: content.into(),
        }
    }
}

/// A message produced by the model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// The text content, possibly empty when the model only requests
    /// invocations.
    pub content: String,
    /// Capability invocations requested by this message, in the order
    /// the model emitted them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<InvocationRequest>,
}

/// Describes a capability invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// The unique identifier for the invocation request.
    pub id: String,
    /// The name of the capability to invoke.
    pub capability: String,
    /// The argument payload, matching the capability's declared schema.
    pub arguments: Value,
}

/// The result of a capability invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Identifier of the invocation request this result answers.
    pub responds_to: String,
    /// The textual result, or an error description when the invocation
    /// could not be carried out.
    pub content: String,
}

/// Describes a capability that can be invoked by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDecl {
    /// Name of the capability.
    pub name: String,
    /// Description of the capability, used by the model to decide when
    /// to invoke it.
    pub description: String,
    /// Parameters definition of the capability.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
