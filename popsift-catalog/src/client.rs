use std::time::Duration;

use crate::CredentialManager;

#[derive(Debug)]
/// An error that can occur when interacting with the client.
pub enum ClientError {
    /// An error that occurred when making a request.
    Transport(reqwest::Error),
    /// An error that occurred when deserializing a response.
    Deserialization(serde_json::Error),
    /// The service rejected the request.
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message, if the service supplied one.
        message: Option<String>,
    },
    /// The service is rate-limiting this client.
    RateLimited {
        /// How long the service asked us to wait before trying again.
        retry_after: Option<Duration>,
    },
}
impl ClientError {
    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::RateLimited { .. } => true,
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Deserialization(_) => false,
        }
    }

    /// The delay the service asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Transport error: {e}"),
            ClientError::Deserialization(e) => write!(f, "Deserialization error: {e}"),
            ClientError::Api { status, message } => {
                write!(f, "API error: {status}")?;
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            ClientError::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(retry_after) = retry_after {
                    write!(f, ", retry after {}s", retry_after.as_secs())?;
                }
                Ok(())
            }
        }
    }
}
impl std::error::Error for ClientError {}
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e)
    }
}
impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Deserialization(e)
    }
}
/// A result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// The default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";
/// The largest page the search endpoint will return.
pub const SEARCH_PAGE_LIMIT: u32 = 50;
/// The deepest offset (plus page) the search endpoint will serve.
pub const SEARCH_RESULT_CEILING: u32 = 2000;
/// The most ids a single audio-features request may carry.
pub const AUDIO_FEATURES_BATCH_LIMIT: usize = 100;

/// A client for the Spotify Web API.
pub struct Client<C> {
    pub(crate) base_url: String,
    pub(crate) credentials: C,
    pub(crate) client: reqwest::Client,
}
impl<C: CredentialManager> Client<C> {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, credentials: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// Acquire a token up front, so bad credentials surface before any real request.
    pub async fn authenticate(&self) -> ClientResult<()> {
        self.credentials.access_token(&self.client).await?;
        Ok(())
    }
}
