use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::{ClientError, ClientResult};

/// Supplies bearer tokens for API requests.
///
/// Where the underlying secrets come from is up to the implementor.
pub trait CredentialManager {
    /// Return a token that is valid for at least the next request.
    fn access_token(
        &self,
        http: &reqwest::Client,
    ) -> impl Future<Output = ClientResult<String>> + Send;
}

/// A token that was acquired elsewhere and is used as-is.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);
impl CredentialManager for StaticToken {
    async fn access_token(&self, _http: &reqwest::Client) -> ClientResult<String> {
        Ok(self.0.clone())
    }
}

/// The OAuth2 client-credentials flow, with the issued token cached until shortly before it expires.
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
    token_url: String,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl ClientCredentials {
    /// The default token endpoint.
    pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
    /// Tokens are refreshed this long before the expiry the service reported.
    pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

    /// Create a new credential manager.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    async fn request_token(&self, http: &reqwest::Client) -> ClientResult<CachedToken> {
        let response = http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: serde_json::from_slice::<TokenError>(&bytes)
                    .ok()
                    .map(|e| e.error_description.unwrap_or(e.error)),
            });
        }

        let token: TokenResponse = serde_json::from_slice(&bytes)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(Self::EXPIRY_MARGIN);
        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
impl CredentialManager for ClientCredentials {
    async fn access_token(&self, http: &reqwest::Client) -> ClientResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.token.clone());
        }

        let token = self.request_token(http).await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_payloads() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"BQD","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "BQD");
        assert_eq!(token.expires_in, 3600);

        let error: TokenError = serde_json::from_str(
            r#"{"error":"invalid_client","error_description":"Invalid client secret"}"#,
        )
        .unwrap();
        assert_eq!(error.error, "invalid_client");
        assert_eq!(error.error_description.as_deref(), Some("Invalid client secret"));
    }

    #[tokio::test]
    async fn test_static_token_is_returned_verbatim() {
        let http = reqwest::Client::new();
        let token = StaticToken("abc".to_string());
        assert_eq!(token.access_token(&http).await.unwrap(), "abc");
    }
}
