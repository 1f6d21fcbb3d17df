use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};

use crate::{Client, ClientError, ClientResult, CredentialManager};

/// Making requests to the Web API.
impl<C: CredentialManager> Client<C> {
    /// Make an authenticated `GET` request to `endpoint` (relative to the base URL)
    /// and deserialize the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the service rejects it, or the response is not valid.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        parameters: &[(&str, String)],
    ) -> ClientResult<T> {
        let token = self.credentials.access_token(&self.client).await?;
        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(token)
            .query(parameters)
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let bytes = response.bytes().await?;

        Self::parse_response(status.as_u16(), retry_after, &bytes)
    }

    fn parse_response<T: DeserializeOwned>(
        status: u16,
        retry_after: Option<Duration>,
        bytes: &[u8],
    ) -> ClientResult<T> {
        if status == 429 {
            return Err(ClientError::RateLimited { retry_after });
        }
        if !(200..300).contains(&status) {
            let message = serde_json::from_slice::<ErrorResponse>(bytes)
                .ok()
                .and_then(|e| e.error.message);
            return Err(ClientError::Api { status, message });
        }

        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
