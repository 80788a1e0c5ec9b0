//! Assistant API client and error types.

use reqwest::{Method, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::{ReqwestTransport, Transport, TransportRequest};
use crate::model::ChatRequest;
use crate::options::ClientOptions;
use crate::stream::ChatEventStream;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The connection failed outside of reqwest (custom transports).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A stream frame carried a payload that is not a valid event.
    #[error("Malformed event payload: {source} | Input: {payload}")]
    Protocol {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP {status}: response has no body")]
    MissingBody { status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the assistant backend.
///
/// Generic over the [`Transport`] so the network can be swapped out; the
/// default is [`ReqwestTransport`].
///
/// # Example
/// ```no_run
/// use assistant_stream::{AssistantClient, ChatRequest, ClientOptions};
/// use futures::StreamExt;
///
/// # async fn run() -> Result<(), assistant_stream::ClientError> {
/// let client = AssistantClient::new(ClientOptions::new("http://localhost:8000/api"))?;
/// let mut events = client.chat_stream(&ChatRequest::new("Hello!")).await?;
/// while let Some(event) = events.next().await {
///     if let Some(token) = event?.token() {
///         print!("{token}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AssistantClient<T = ReqwestTransport> {
    base_url: Url,
    transport: T,
}

impl AssistantClient<ReqwestTransport> {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&options)?;
        Self::with_transport(&options.base_url, transport)
    }
}

impl<T: Transport> AssistantClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL {base_url} cannot have path segments"
            )));
        }
        Ok(Self {
            base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve an endpoint below the base URL.
    ///
    /// Each segment is percent-encoded on its own, so identifiers containing
    /// `/` or `?` stay a single path segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base URL {} cannot have path segments", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a chat message and stream the reply.
    ///
    /// Issues exactly one `POST {base}/chat`. A non-success status or a
    /// missing body fails here, before any event is produced. The returned
    /// stream yields events in arrival order and ends with the response
    /// body; dropping it closes the connection.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatEventStream, ClientError> {
        let url = self.endpoint(&["chat"])?;
        debug!(
            %url,
            conversation_id = ?request.conversation_id,
            attachments = request.attachment_ids.len(),
            "opening chat stream"
        );

        let body = serde_json::to_value(request)?;
        let response = self
            .transport
            .send(TransportRequest::json(Method::POST, url, body))
            .await?;

        let status = response.status;
        if !response.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status, "chat request rejected");
            return Err(ClientError::Status { status, body });
        }

        let body = response.body.ok_or(ClientError::MissingBody { status })?;
        Ok(ChatEventStream::new(body))
    }
}
