//! HTTP client for the Bizlink backend
//!
//! `ApiClient` owns the base URL, one `reqwest::Client` and the current bearer
//! token. Every call issues exactly one request (no retries) and parses the
//! backend's `{status, data, message, token}` envelope, mapping failures onto
//! [`ApiError`].

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::AuthToken;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Response envelope shared by every backend endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// The `data` payload; a success envelope without one is a schema mismatch
    pub fn into_data(self) -> ApiResult<T> {
        self.data
            .ok_or_else(|| ApiError::Decode("response envelope has no data".to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Map a reqwest failure onto the transport variant
///
/// The request URL is stripped first: the news endpoint carries its API key
/// in the query string and these messages end up in logs and on stderr.
pub(crate) fn classify_reqwest_error(e: reqwest::Error) -> ApiError {
    let e = e.without_url();
    if e.is_timeout() {
        ApiError::Transport(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        ApiError::Transport(format!("Connection failed: {}", e))
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// Read the body of a response, turning non-2xx statuses into
/// `ApiError::Status` with whatever message the server supplied
pub(crate) async fn read_body(response: Response) -> ApiResult<(StatusCode, String)> {
    let status = response.status();
    let body = response.text().await.map_err(classify_reqwest_error)?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    Ok((status, body))
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<Envelope<T>> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !envelope.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: envelope.message.filter(|m| !m.trim().is_empty()),
        });
    }

    Ok(envelope)
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: RwLock<Option<AuthToken>>,
}

impl ApiClient {
    /// Create a client for `base_url`; `timeout` of `None` means requests
    /// never time out
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(classify_reqwest_error)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: AuthToken) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// The current token, or `ApiError::Unauthenticated` without touching
    /// the network
    pub fn require_token(&self) -> ApiResult<AuthToken> {
        self.token().ok_or(ApiError::Unauthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header("accept", "application/json");

        match self.token() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<Envelope<T>> {
        tracing::debug!(%method, path, "Sending API request");

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let (status, body) = read_body(response).await.inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "API request failed");
        })?;

        decode_envelope(status, &body)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Envelope<T>> {
        let builder = self.request(Method::GET, path);
        self.execute(Method::GET, path, builder).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(Method::POST, path, builder).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        self.execute(Method::PUT, path, builder).await
    }

    /// DELETE accepts either an empty body (204) or a success envelope
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        tracing::debug!(method = "DELETE", path, "Sending API request");

        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        let (status, body) = read_body(response).await?;

        if body.trim().is_empty() {
            return Ok(());
        }

        decode_envelope::<serde_json::Value>(status, &body).map(|_| ())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<Envelope<T>> {
        let builder = self.request(Method::POST, path).multipart(form);
        self.execute(Method::POST, path, builder).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.has_token())
            .finish()
    }
}
