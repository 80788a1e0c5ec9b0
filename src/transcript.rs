//! Folding chat events into an assistant reply.

use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::client::ClientError;
use crate::model::{ChatEvent, EventKind, Message, Role, SourceChunk};

/// The assistant's answer as assembled from stream events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Conversation the server filed this exchange under
    pub conversation_id: Option<String>,
    pub content: String,
    pub sources: Vec<SourceChunk>,
    /// Last `meta` payload received
    pub meta: Option<Value>,
    /// Error reported in-band by the server
    pub error: Option<String>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// Tokens are appended, a `sources` event replaces the citation list.
    /// Unknown kinds are ignored.
    pub fn apply(&mut self, event: &ChatEvent) -> Result<(), ClientError> {
        match &event.kind {
            EventKind::Meta => {
                if let Some(id) = event.conversation_id() {
                    self.conversation_id = Some(id.to_string());
                }
                self.meta = Some(event.data.clone());
            }
            EventKind::Token => {
                if let Some(token) = event.token() {
                    self.content.push_str(token);
                }
            }
            EventKind::Sources => self.sources = event.data_as()?,
            EventKind::Error => self.error = event.error_message(),
            EventKind::Other(kind) => tracing::trace!(%kind, "ignoring unknown event kind"),
        }
        Ok(())
    }

    /// Drain a stream of events into a reply.
    ///
    /// Stops at the first stream error.
    pub async fn collect<S>(events: S) -> Result<Self, ClientError>
    where
        S: Stream<Item = Result<ChatEvent, ClientError>>,
    {
        futures::pin_mut!(events);
        let mut reply = Self::new();
        while let Some(event) = events.next().await {
            reply.apply(&event?)?;
        }
        Ok(reply)
    }

    /// Whether the server reported an error for this reply.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            sources: self.sources,
            attachments: Vec::new(),
        }
    }
}
