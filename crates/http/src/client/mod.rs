//! Fawwerty API client

pub mod auth;
pub mod error;
pub mod resources;

use crate::auth_payload::refreshed_token;
use error::ClientError;
use fawwerty_core::{AUTH_TOKEN_KEY, ApiConfig, KeyValueStore};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Callback invoked when the pipeline gives up on the current token
pub type AuthExpiredHandler = Arc<dyn Fn() + Send + Sync>;

/// Method, body and extra headers for one call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self::with_body(Method::POST, body)
    }

    pub fn patch(body: Value) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header; later values replace earlier ones
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Whether `endpoint` belongs to the `/auth` namespace
///
/// Auth endpoints never carry a bearer token and never trigger a refresh.
/// The legacy web client refreshed on any 401, including ones from `/auth/*`.
pub fn is_auth_endpoint(endpoint: &str) -> bool {
    let path = endpoint.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_start_matches('/');
    path == "auth" || path.starts_with("auth/")
}

struct Inner {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    store: Option<Arc<dyn KeyValueStore>>,
    on_auth_expired: RwLock<Option<AuthExpiredHandler>>,
}

/// Fawwerty API client
///
/// Clones share the token slot, so a refresh performed through one clone is
/// seen by all of them.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Current bearer token
    pub fn auth_token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a bearer token, writing it through to durable storage
    pub fn set_auth_token(&self, token: &str) -> Result<(), ClientError> {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        if let Some(store) = &self.inner.store {
            store.set(AUTH_TOKEN_KEY, token)?;
        }
        Ok(())
    }

    /// Forget the bearer token in memory and in durable storage
    pub fn clear_auth_token(&self) -> Result<(), ClientError> {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(store) = &self.inner.store {
            store.remove(AUTH_TOKEN_KEY)?;
        }
        Ok(())
    }

    /// Register the callback run when a refresh inside the pipeline fails
    pub fn on_auth_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .on_auth_expired
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Full URL for an endpoint path
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.inner.base_url)
        } else {
            format!("{}/{endpoint}", self.inner.base_url)
        }
    }

    /// WebSocket URL for a real-time endpoint
    pub fn websocket_url(&self, endpoint: &str) -> String {
        self.url(endpoint).replacen("http", "ws", 1)
    }

    /// Issue an authenticated call with a single refresh-and-retry on 401
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses (including a 401 that
    /// survives the retry or a failed refresh) and undecodable bodies.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let url = self.url(endpoint);
        let authorized = !is_auth_endpoint(endpoint);
        let token = if authorized { self.auth_token() } else { None };

        let mut response = self.send(&url, &options, token.as_deref()).await?;

        // Anonymous calls have no session to refresh; their 401 is surfaced as is
        if response.status() == StatusCode::UNAUTHORIZED && token.is_some() {
            debug!(endpoint, "Received 401, attempting token refresh");
            match self.refresh_token().await.map(|resp| refreshed_token(&resp)) {
                Ok(Some(new_token)) => {
                    if let Err(e) = self.set_auth_token(&new_token) {
                        warn!(error = %e, "Failed to persist refreshed token");
                    }
                    // Retried exactly once; a second 401 is surfaced below
                    response = self.send(&url, &options, Some(&new_token)).await?;
                }
                Ok(None) => {
                    warn!(endpoint, "Token refresh returned no token");
                    self.expire_session();
                }
                Err(e) => {
                    warn!(endpoint, error = %e, "Token refresh failed");
                    self.expire_session();
                }
            }
        }

        Self::decode(response).await
    }

    /// Send one HTTP request without any retry logic
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut request = self
            .inner
            .client
            .request(options.method.clone(), url)
            .header(header::CONTENT_TYPE, "application/json")
            .headers(options.headers.clone());

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        trace!(method = %options.method, url, "Sending request");
        request.send().await.map_err(|e| {
            error!(url, error = %e, "API request failed");
            ClientError::from(e)
        })
    }

    /// Decode a response body, converting non-success statuses to errors
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(serde_json::from_value(Value::Null)?);
            }
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            debug!(status = status.as_u16(), %message, "Request rejected");
            Err(ClientError::from_status(status, message))
        }
    }

    fn expire_session(&self) {
        if let Err(e) = self.clear_auth_token() {
            warn!(error = %e, "Failed to clear stored token");
        }
        let handler = self
            .inner
            .on_auth_expired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    token_store: Option<Arc<dyn KeyValueStore>>,
}

impl ApiClientBuilder {
    /// Builder seeded from configuration
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut builder = Self::default().base_url(config.base_url.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Write tokens through to this store under `authToken`
    #[must_use]
    pub fn token_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("fawwerty-client/", env!("CARGO_PKG_VERSION")).into()),
        );

        let client = client_builder.build()?;

        Ok(ApiClient {
            inner: Arc::new(Inner {
                client,
                base_url,
                token: RwLock::new(None),
                store: self.token_store,
                on_auth_expired: RwLock::new(None),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fawwerty_core::MemoryStore;

    #[test]
    fn test_auth_namespace_detection() {
        assert!(is_auth_endpoint("/auth/login"));
        assert!(is_auth_endpoint("auth/refresh"));
        assert!(is_auth_endpoint("/auth"));
        assert!(is_auth_endpoint("/auth/verify2fa?x=1"));
        assert!(!is_auth_endpoint("/authors"));
        assert!(!is_auth_endpoint("/admin/auth-logs"));
        assert!(!is_auth_endpoint("/incidents"));
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:3001/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001/api");
        assert_eq!(client.url("/billing"), "http://localhost:3001/api/billing");
        assert_eq!(client.url("billing"), "http://localhost:3001/api/billing");
        assert_eq!(
            client.websocket_url("/messages/live"),
            "ws://localhost:3001/api/messages/live"
        );
    }

    #[test]
    fn test_https_base_becomes_wss() {
        let client = ApiClient::new("https://api.example.test").unwrap();
        assert_eq!(client.websocket_url("/ws"), "wss://api.example.test/ws");
    }

    #[test]
    fn test_token_writes_through_to_store() {
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::builder()
            .base_url("http://localhost")
            .token_store(store.clone())
            .build()
            .unwrap();

        client.set_auth_token("t1").unwrap();
        assert_eq!(client.auth_token().as_deref(), Some("t1"));
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("t1"));

        // Clones share the same slot
        let clone = client.clone();
        clone.clear_auth_token().unwrap();
        assert_eq!(client.auth_token(), None);
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_builder_rejects_empty_base_url() {
        assert!(matches!(
            ApiClient::builder().build(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ApiClient::new("/"),
            Err(ClientError::Configuration(_))
        ));
    }
}
