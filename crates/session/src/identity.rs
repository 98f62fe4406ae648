//! External identity provider (Google) seam
//!
//! The provider SDK loads asynchronously and reports readiness through a
//! [`watch`] channel. Callers wait for `Ready` with a bounded timeout; a
//! `Failed` signal and an expired timeout are reported separately.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Default bound on waiting for the provider SDK
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Load state of the provider SDK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SdkStatus {
    Loading,
    Ready,
    Failed,
}

/// Parameters of the provider's token flow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequest {
    pub client_id: Option<String>,
    pub scope: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Google API failed to load")]
    LoadFailed,

    #[error("Google API load timed out")]
    TimedOut,

    #[error("Identity provider not configured")]
    NotConfigured,

    #[error("{0}")]
    Flow(String),
}

/// A token-issuing identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Receiver tracking the SDK load state
    fn status(&self) -> watch::Receiver<SdkStatus>;

    /// Run the provider's token flow
    ///
    /// `Ok(None)` means the flow finished without granting a token.
    async fn request_access_token(
        &self,
        request: &TokenRequest,
    ) -> Result<Option<String>, IdentityError>;
}

/// Wait until `status` reports `Ready`
///
/// # Errors
///
/// `LoadFailed` if the SDK reports failure or its sender goes away,
/// `TimedOut` if neither signal arrives within `timeout`.
pub async fn wait_until_ready(
    mut status: watch::Receiver<SdkStatus>,
    timeout: Duration,
) -> Result<(), IdentityError> {
    let wait = async move {
        loop {
            match *status.borrow_and_update() {
                SdkStatus::Ready => return Ok(()),
                SdkStatus::Failed => return Err(IdentityError::LoadFailed),
                SdkStatus::Loading => {}
            }
            if status.changed().await.is_err() {
                return Err(IdentityError::LoadFailed);
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .unwrap_or(Err(IdentityError::TimedOut))
}

/// Provider that is always ready and hands out a pre-obtained token
///
/// Used where the provider's consent flow ran elsewhere, e.g. a CLI given
/// an access token on the command line.
pub struct StaticTokenProvider {
    token: String,
    status: watch::Sender<SdkStatus>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let (status, _) = watch::channel(SdkStatus::Ready);
        Self {
            token: token.into(),
            status,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    fn status(&self) -> watch::Receiver<SdkStatus> {
        self.status.subscribe()
    }

    async fn request_access_token(
        &self,
        _request: &TokenRequest,
    ) -> Result<Option<String>, IdentityError> {
        Ok(Some(self.token.clone()).filter(|t| !t.is_empty()))
    }
}
