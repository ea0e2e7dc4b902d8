use std::fmt::{self, Display};
use std::sync::Arc;

use tokio::time::Instant;
use turnloop_core::capability::Capability;
use turnloop_core::session::{self, MemoryStore, SessionStore};
use turnloop_core::{
    Conversation, DEFAULT_MAX_STEPS, TurnError, TurnExecutor,
    TurnExecutorBuilder, TurnOptions, TurnOutcome,
};
use turnloop_model::ModelProvider;

/// A chat builder.
///
/// See [`Chat`].
pub struct ChatBuilder {
    executor_builder: TurnExecutorBuilder,
    store: Option<Arc<dyn SessionStore>>,
    max_steps: usize,
}

impl ChatBuilder {
    /// Creates a chat builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let executor_builder =
            TurnExecutorBuilder::with_model_provider(provider);
        Self {
            executor_builder,
            store: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Sets the system prompt for new sessions.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.executor_builder =
            self.executor_builder.with_system_prompt(prompt);
        self
    }

    /// Registers a capability.
    #[inline]
    pub fn with_capability<T: Capability>(mut self, capability: T) -> Self {
        self.executor_builder =
            self.executor_builder.with_capability(capability);
        self
    }

    /// Sets the session store. Defaults to an in-memory store.
    #[inline]
    pub fn with_session_store<S: SessionStore + 'static>(
        mut self,
        store: S,
    ) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets the per-turn model-call ceiling.
    #[inline]
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Attaches a callback to be invoked for every chunk of assistant
    /// text as it arrives.
    #[inline]
    pub fn on_delta(
        mut self,
        on_delta: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.executor_builder = self.executor_builder.on_delta(on_delta);
        self
    }

    /// Builds a new chat.
    pub fn build(self) -> Chat {
        let executor = self.executor_builder.build();
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };
        Chat {
            executor,
            store,
            max_steps: self.max_steps,
        }
    }
}

/// A multi-session chat service.
///
/// Each call to [`Chat::send_message`] is one turn: the session's prior
/// conversation is retrieved, the turn executor runs its loop, and the
/// produced messages are appended back atomically. Turns for different
/// sessions are fully independent; a failed turn leaves its session
/// untouched.
pub struct Chat {
    executor: TurnExecutor,
    store: Arc<dyn SessionStore>,
    max_steps: usize,
}

impl Chat {
    /// Sends a user message to the given session and runs the turn to
    /// completion.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        self.send_message_with_deadline(session_id, text, None).await
    }

    /// Like [`Chat::send_message`], but the turn is cancelled when the
    /// deadline passes while a model call or capability invocation is
    /// outstanding. Nothing is appended to the session on cancellation.
    pub async fn send_message_with_deadline(
        &self,
        session_id: &str,
        text: &str,
        deadline: Option<Instant>,
    ) -> Result<TurnOutcome, ChatError> {
        debug!("running a turn for session `{session_id}`");
        let conversation = self
            .store
            .get(session_id)
            .await
            .map_err(ChatError::Store)?;
        let options = TurnOptions {
            max_steps: self.max_steps,
            deadline,
        };
        let outcome = self
            .executor
            .run_turn(&conversation, text, options)
            .await
            .map_err(ChatError::Turn)?;
        self.store
            .append(session_id, outcome.messages.clone())
            .await
            .map_err(ChatError::Store)?;
        debug!(
            "appended {} message(s) to session `{session_id}`",
            outcome.messages.len()
        );
        Ok(outcome)
    }

    /// Returns the stored conversation for the given session.
    pub async fn history(
        &self,
        session_id: &str,
    ) -> Result<Conversation, ChatError> {
        self.store.get(session_id).await.map_err(ChatError::Store)
    }
}

/// An error from a chat turn.
#[derive(Debug)]
pub enum ChatError {
    /// The turn executor failed. Nothing was appended to the session.
    Turn(TurnError),
    /// The session store failed.
    Store(session::Error),
}

impl Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Turn(err) => write!(f, "turn failed: {err}"),
            ChatError::Store(err) => write!(f, "session store failed: {err}"),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Turn(err) => Some(err),
            ChatError::Store(err) => Some(err),
        }
    }
}
