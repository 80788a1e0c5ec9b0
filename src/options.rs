//! Client configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

pub const ENV_BASE_URL: &str = "ASSISTANT_API_URL";
pub const ENV_SESSION_COOKIE: &str = "ASSISTANT_SESSION_COOKIE";
pub const ENV_TIMEOUT_SECS: &str = "ASSISTANT_TIMEOUT_SECS";

/// A secret string type for sensitive data like session cookies.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Options for the HTTP client talking to the assistant API.
///
/// # Example
/// ```rust
/// use assistant_stream::options::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::new("https://example.org/api/")
///     .with_timeout(Duration::from_secs(120))
///     .with_session_cookie("session=abc");
/// assert_eq!(options.base_url, "https://example.org/api");
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL all endpoints are resolved against, without trailing slash
    pub base_url: String,

    /// Whole-request timeout. Applies to streams too, so keep it generous.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,

    /// Raw `Cookie` header value identifying the session
    pub session_cookie: Option<SecretString>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            proxy: None,
            extra_headers: None,
            session_cookie: None,
        }
    }

    /// Read options from `ASSISTANT_API_URL`, `ASSISTANT_SESSION_COOKIE`
    /// and `ASSISTANT_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut options =
            Self::new(lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()));

        if let Some(cookie) = lookup(ENV_SESSION_COOKIE) {
            options = options.with_session_cookie(cookie);
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"))
            })?;
            options = options.with_timeout(Duration::from_secs(secs));
        }

        Ok(options)
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<SecretString>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }
}
