//! Data models shared with the assistant backend.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_TOP_K: u32 = 5;

fn default_include_citations() -> bool {
    true
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

/// Optional hint about where in the host application the user is asking from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Arbitrary structured data describing the page state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Body of a chat request.
///
/// Every optional field is always sent; an absent conversation id or
/// context goes out as `null`.
///
/// # Example
/// ```
/// use assistant_stream::model::ChatRequest;
///
/// let request = ChatRequest::new("What is in the report?")
///     .in_conversation("c-42")
///     .with_top_k(3);
/// assert!(request.include_citations);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    #[serde(default = "default_include_citations")]
    pub include_citations: bool,

    /// Number of retrieved chunks to ground the answer on
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Conversation to continue; `None` starts a new one
    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub attachment_ids: Vec<String>,

    #[serde(default)]
    pub context: Option<AssistantContext>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            include_citations: default_include_citations(),
            top_k: DEFAULT_TOP_K,
            conversation_id: None,
            attachment_ids: Vec::new(),
            context: None,
        }
    }

    pub fn with_citations(mut self, include: bool) -> Self {
        self.include_citations = include;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_attachments<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attachment_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_context(mut self, context: AssistantContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Discriminator of a [`ChatEvent`].
///
/// Unrecognised kinds are kept verbatim in [`EventKind::Other`] so that new
/// server-side event types pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Meta,
    Token,
    Sources,
    Error,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Meta => "meta",
            EventKind::Token => "token",
            EventKind::Sources => "sources",
            EventKind::Error => "error",
            EventKind::Other(kind) => kind,
        }
    }
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "meta" => EventKind::Meta,
            "token" => EventKind::Token,
            "sources" => EventKind::Sources,
            "error" => EventKind::Error,
            _ => EventKind::Other(kind),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event decoded from the chat stream.
///
/// Deserializing requires a `type` field. A missing `data` field becomes
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Kind-dependent payload; `null` when the server omits it
    #[serde(default)]
    pub data: Value,
}

impl ChatEvent {
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// Text of a `token` event.
    pub fn token(&self) -> Option<&str> {
        match self.kind {
            EventKind::Token => self.data.as_str(),
            _ => None,
        }
    }

    /// Conversation id announced by a `meta` event.
    pub fn conversation_id(&self) -> Option<&str> {
        match self.kind {
            EventKind::Meta => self.data.get("conversation_id")?.as_str(),
            _ => None,
        }
    }

    /// Message of an `error` event, either a bare string or `{"message": ..}`.
    pub fn error_message(&self) -> Option<String> {
        if self.kind != EventKind::Error {
            return None;
        }
        match &self.data {
            Value::String(message) => Some(message.clone()),
            Value::Null => None,
            other => Some(
                other
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            ),
        }
    }

    /// Deserialize the payload into a caller-chosen type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// A retrieved document chunk cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    pub source: String,

    #[serde(default)]
    pub title: Option<String>,

    pub text: String,

    #[serde(default)]
    pub score: Option<f64>,
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A file attached to a message in conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Summary row of a stored conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub message_count: u64,
    /// Unix timestamp, seconds
    pub last_message_at: f64,
    #[serde(default)]
    pub last_snippet: Option<String>,
}

/// An uploaded file as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentItem {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub created_at: f64,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// The signed-in user as seen by the web application shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    #[serde(flatten)]
    pub user: UserInfo,

    /// The user still has to accept the terms of service
    #[serde(default)]
    pub terms_required: bool,
}

/// Result of a file upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Items<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Messages {
    pub messages: Vec<Message>,
}
