//! Session storage: maps a session identifier to its conversation.

use std::collections::HashMap;
use std::fmt::{self, Display};

use async_trait::async_trait;
use tokio::sync::RwLock;
use turnloop_model::ModelMessage;

use crate::conversation::Conversation;

/// An error from a session store backend.
///
/// The in-memory store never fails; the type exists so that durable
/// backends can report theirs.
#[derive(Debug)]
pub struct Error {
    message: String,
}

impl Error {
    /// Creates a new error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}

/// Keyed storage for conversations.
///
/// A store entry owns one conversation for the lifetime of a session
/// identifier: created on first use, mutated only by appending, never
/// truncated automatically. Sessions are fully independent; no
/// cross-session coordination is required of implementations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the conversation for the given session identifier, or an
    /// empty conversation if the identifier has not been seen.
    ///
    /// Calling this twice with no intervening `append` returns identical
    /// conversations.
    async fn get(&self, session_id: &str) -> Result<Conversation, Error>;

    /// Appends messages to the session's conversation, creating it on
    /// first use.
    ///
    /// This is the only mutator, and it is atomic with respect to a
    /// single session identifier: a concurrent `get` observes either
    /// none or all of the appended messages.
    async fn append(
        &self,
        session_id: &str,
        messages: Vec<ModelMessage>,
    ) -> Result<(), Error>;
}

/// In-memory session store backed by a map behind a `RwLock`.
///
/// Suitable for testing and single-process use; durable backends are
/// expected to live in their own crate.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Conversation>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Result<Conversation, Error> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn append(
        &self,
        session_id: &str,
        messages: Vec<ModelMessage>,
    ) -> Result<(), Error> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_owned())
            .or_default()
            .extend(messages);
        Ok(())
    }
}
