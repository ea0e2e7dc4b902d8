
use std::sync::Arc;

use tokio::time::{Instant, timeout_at};
use tracing::Instrument;
use turnloop_model::{
    AssistantMessage, ErrorKind, InvocationRequest, InvocationResult,
    ModelMessage, ModelProvider, ModelRequest,
};

use crate::capability::{Capability, Registry};
use crate::conversation::Conversation;
use crate::error::{CancelPhase, TurnError};
use crate::model_client::{ModelClient, ModelClientResponse};

/// The default ceiling for model calls within a single turn, preventing
/// runaway invocation chains.
pub const DEFAULT_MAX_STEPS: usize = 25;

type DeltaFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for a single turn.
#[derive(Clone, Debug)]
pub struct TurnOptions {
    /// The maximum number of model calls for this turn.
    pub max_steps: usize,
    /// If set, the turn is cancelled when the deadline passes while a
    /// model call or capability invocation is outstanding.
    pub deadline: Option<Instant>,
}

impl Default for TurnOptions {
    #[inline]
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            deadline: None,
        }
    }
}

/// The messages produced by a completed turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// Everything this turn appended: the user message, assistant
    /// messages, and capability results, in order.
    pub messages: Vec<ModelMessage>,
    /// The text of the final assistant response.
    pub response: String,
}

/// Runs turns against a model provider and a set of capabilities.
///
/// A turn is one user message plus all resulting model/capability
/// exchanges up to the next plain assistant response. The executor
/// alternates between asking the model for its next message and
/// resolving the invocations that message requests, until the model
/// produces a message with no pending invocations.
pub struct TurnExecutor {
    model_client: ModelClient,
    registry: Registry,
    system_prompt: Option<String>,
    on_delta: Option<DeltaFn>,
}

impl TurnExecutor {
    /// Runs one turn on top of the given conversation.
    ///
    /// On success, returns the messages this turn produced; the caller
    /// owns appending them to the conversation. The conversation itself
    /// is never mutated, so a failed turn leaves no trace in it.
    pub async fn run_turn(
        &self,
        conversation: &Conversation,
        input: &str,
        options: TurnOptions,
    ) -> Result<TurnOutcome, TurnError> {
        let mut messages: Vec<ModelMessage> = Vec::new();
        if conversation.is_empty() {
            if let Some(prompt) = &self.system_prompt {
                messages.push(ModelMessage::system(prompt.clone()));
            }
        }
        messages.push(ModelMessage::user(input));

        // A zero budget allows no model call at all, so the turn ends
        // before the first one.
        if options.max_steps == 0 {
            return Err(TurnError::ExecutionLimitExceeded {
                messages,
                model_calls: 0,
            });
        }

        let capabilities = self.registry.declarations();
        let mut model_calls = 0;

        loop {
            model_calls += 1;
            debug!("model call {model_calls} of at most {}", options.max_steps);

            let request = ModelRequest {
                messages: conversation
                    .messages()
                    .iter()
                    .chain(messages.iter())
                    .cloned()
                    .collect(),
                capabilities: capabilities.clone(),
            };
            let resp = self
                .send_model_request(request, options.deadline, model_calls)
                .await?;

            let response_text = resp.content.clone();
            let invocations = resp.invocations.clone();
            messages.push(ModelMessage::Assistant(AssistantMessage {
                content: resp.content,
                invocations: resp.invocations,
            }));

            if invocations.is_empty() {
                debug!("turn finished after {model_calls} model call(s)");
                return Ok(TurnOutcome {
                    messages,
                    response: response_text,
                });
            }

            if model_calls >= options.max_steps {
                warn!("model-call budget exhausted, aborting the turn");
                return Err(TurnError::ExecutionLimitExceeded {
                    messages,
                    model_calls,
                });
            }

            // Invocations are resolved sequentially, in the order the
            // model emitted them; results keep that order so the model
            // sees a stable correlation.
            for req in &invocations {
                let result =
                    self.resolve_invocation(req, options.deadline).await?;
                messages.push(ModelMessage::CapabilityResult(result));
            }
        }
    }

    async fn send_model_request(
        &self,
        request: ModelRequest,
        deadline: Option<Instant>,
        step: usize,
    ) -> Result<ModelClientResponse, TurnError> {
        let on_delta = self.on_delta.clone();
        let fut = self.model_client.send_request(request, move |chunk| {
            if let Some(on_delta) = &on_delta {
                on_delta(chunk);
            }
        });
        let resp_or_err = bounded(deadline, fut, || CancelPhase::ModelCall {
            step,
        })
        .await?;
        resp_or_err.map_err(|source| match source.kind() {
            ErrorKind::Rejected => TurnError::ModelRejected { step, source },
            _ => TurnError::ModelUnavailable { step, source },
        })
    }

    /// Resolves a single invocation request into a result message.
    ///
    /// Unknown capabilities and capability failures fail soft: the error
    /// description becomes the result content and the caller's loop
    /// continues. Only cancellation is fatal here.
    async fn resolve_invocation(
        &self,
        req: &InvocationRequest,
        deadline: Option<Instant>,
    ) -> Result<InvocationResult, TurnError> {
        let content = match self.registry.dispatch(req) {
            None => {
                format!("Error: unknown capability `{}`", req.capability)
            }
            Some(fut) => {
                let fut = fut.instrument(debug_span!("capability execute"));
                let result = bounded(deadline, fut, || {
                    CancelPhase::Capability {
                        name: req.capability.clone(),
                        invocation_id: req.id.clone(),
                    }
                })
                .await?;
                match result {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(
                            "capability `{}` failed: {err}",
                            req.capability
                        );
                        format!("Error: {}", err.reason())
                    }
                }
            }
        };
        Ok(InvocationResult {
            responds_to: req.id.clone(),
            content,
        })
    }
}

/// Awaits `fut`, aborting it with a `Cancelled` error when the deadline
/// passes first.
async fn bounded<T>(
    deadline: Option<Instant>,
    fut: impl Future<Output = T>,
    phase: impl FnOnce() -> CancelPhase,
) -> Result<T, TurnError> {
    match deadline {
        Some(deadline) => match timeout_at(deadline, fut).await {
            Ok(value) => Ok(value),
            Err(_) => Err(TurnError::Cancelled { phase: phase() }),
        },
        None => Ok(fut.await),
    }
}

/// [`TurnExecutor`] builder.
pub struct TurnExecutorBuilder {
    model_client: ModelClient,
    registry: Registry,
    system_prompt: Option<String>,
    on_delta: Option<DeltaFn>,
}

impl TurnExecutorBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Registry::default(),
            system_prompt: None,
            on_delta: None,
        }
    }

    /// Sets the system prompt, seeded into a conversation on its first
    /// turn.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a capability.
    #[inline]
    pub fn with_capability<T: Capability>(mut self, capability: T) -> Self {
        self.registry.add(capability);
        self
    }

    /// Attaches a callback to be invoked for every chunk of assistant
    /// text as it arrives.
    #[inline]
    pub fn on_delta(
        mut self,
        on_delta: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_delta = Some(Arc::new(on_delta));
        self
    }

    /// Builds the executor.
    #[inline]
    pub fn build(self) -> TurnExecutor {
        TurnExecutor {
            model_client: self.model_client,
            registry: self.registry,
            system_prompt: self.system_prompt,
            on_delta: self.on_delta,
        }
    }
}
