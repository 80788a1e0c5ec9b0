//! HTTP transport for the assistant API.
//!
//! [`Transport`] is the seam between the client and the network. The
//! production implementation is [`ReqwestTransport`]; tests plug in an
//! in-memory one.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ClientError;
use crate::options::ClientOptions;

/// Response body delivered chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A file to send as a multipart upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Sent as the `file` field of a multipart form
    Multipart(FileUpload),
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: RequestBody::Empty,
        }
    }

    pub fn json(method: Method, url: Url, body: Value) -> Self {
        Self {
            method,
            url,
            body: RequestBody::Json(body),
        }
    }
}

/// Status line and body of a response.
///
/// The body is left unread so streaming callers can consume it lazily.
/// Dropping the response (or its body) releases the connection.
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Option<ByteStream>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<ByteStream>) -> Self {
        Self {
            status,
            content_type: None,
            body,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"))
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        let Some(mut body) = self.body else {
            return Ok(Bytes::new());
        };
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, ClientError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the whole body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Turn a non-success response into [`ClientError::Status`] carrying the body text.
    pub async fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status;
        let body = self.text().await.unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Sends one request and hands back the unread response.
///
/// Implementations must not retry and must not buffer the body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError>;
}

/// Build a configured HTTP client from client options.
///
/// The client keeps a cookie store so session cookies set by the backend
/// are sent back on later requests. A configured session cookie seeds that
/// store for the base URL and is replaced when the backend rotates it.
pub fn build_http_client(options: &ClientOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder().cookie_provider(Arc::new(cookie_jar(options)?));

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    Ok(builder.build()?)
}

fn cookie_jar(options: &ClientOptions) -> Result<Jar, ClientError> {
    let jar = Jar::default();
    let Some(cookie) = &options.session_cookie else {
        return Ok(jar);
    };

    let url = Url::parse(&options.base_url)
        .map_err(|e| ClientError::Config(format!("invalid base URL {:?}: {e}", options.base_url)))?;
    // A `Cookie` header value may carry several `name=value` pairs.
    for pair in cookie.expose_secret().split(';').map(str::trim).filter(|p| !p.is_empty()) {
        jar.add_cookie_str(pair, &url);
    }
    Ok(jar)
}

/// Add extra headers to a request if specified in client options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    extra_headers: Option<HashMap<String, String>>,
}

impl ReqwestTransport {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(options)?,
            extra_headers: options.extra_headers.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        let mut req = self.client.request(request.method, request.url);
        req = add_extra_headers(req, &self.extra_headers);

        req = match request.body {
            RequestBody::Empty => req,
            RequestBody::Json(body) => req.json(&body),
            RequestBody::Multipart(file) => {
                let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
                if let Some(content_type) = &file.content_type {
                    part = part.mime_str(content_type)?;
                }
                req.multipart(Form::new().part("file", part))
            }
        };

        let response = req.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body: ByteStream = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(ClientError::from)));

        Ok(TransportResponse {
            status,
            content_type,
            body: Some(body),
        })
    }
}
