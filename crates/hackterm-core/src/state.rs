//! UI-agnostic conversation state
//!
//! A [`Conversation`] is the whole session: an append-only message log plus
//! the in-flight flag. UIs drive it through [`Conversation::begin`] and
//! [`Conversation::settle`] so the transport call can run wherever they
//! like, or through [`Conversation::submit`] when awaiting inline is fine.

use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::transport::{BackendReply, Transport, TransportError};

/// Seeded assistant message every conversation starts with.
pub const GREETING: &str = "SYSTEM ONLINE. AWAITING INPUT...";

/// Shown when the backend answered without a usable field.
pub const NO_DATA: &str = "NO DATA RECEIVED FROM MAINFRAME.";

/// Shown when the backend could not be reached or understood.
pub const CONNECTION_FAILED: &str = "CRITICAL ERROR: CONNECTION FAILED.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A dispatched request waiting for its transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub endpoint: Endpoint,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            pending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Move from idle to awaiting a response.
    ///
    /// Blank input (after trimming) is ignored and leaves both the log and
    /// `input` untouched. Otherwise the raw input is logged as a user
    /// message, `input` is cleared, and the request to dispatch is returned.
    ///
    /// Calling this while already pending is allowed; each request settles
    /// independently in whatever order the responses arrive.
    pub fn begin(&mut self, input: &mut String, endpoint: Endpoint) -> Option<PendingRequest> {
        if input.trim().is_empty() {
            return None;
        }

        let message = std::mem::take(input);
        self.messages.push(ChatMessage::user(message.clone()));
        self.pending = true;

        Some(PendingRequest { endpoint, message })
    }

    /// Record the outcome of a request and return to idle.
    ///
    /// Exactly one assistant message is appended, whatever the outcome.
    pub fn settle(&mut self, endpoint: Endpoint, outcome: Result<BackendReply, TransportError>) {
        let content = match outcome {
            Ok(reply) => resolve_reply(endpoint, reply),
            Err(e) => {
                tracing::warn!(endpoint = endpoint.as_str(), error = %e, "transport failed");
                CONNECTION_FAILED.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(content));
        self.pending = false;
    }

    /// Begin, call `transport`, and settle in one step.
    pub async fn submit<T>(&mut self, input: &mut String, endpoint: Endpoint, transport: &T)
    where
        T: Transport + ?Sized,
    {
        let Some(request) = self.begin(input, endpoint) else {
            return;
        };

        let outcome = transport.send(request.endpoint, &request.message).await;
        self.settle(request.endpoint, outcome);
    }
}

/// Pick the text to show for a successful response: the endpoint's answer
/// field, then the backend's own error, then [`NO_DATA`]. Empty strings
/// count as missing.
pub fn resolve_reply(endpoint: Endpoint, reply: BackendReply) -> String {
    let non_empty = |s: &&str| !s.is_empty();

    reply
        .answer(endpoint)
        .filter(non_empty)
        .or(reply.error.as_deref().filter(non_empty))
        .unwrap_or(NO_DATA)
        .to_string()
}
