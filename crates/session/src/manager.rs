//! Session manager

use crate::identity::{IdentityError, IdentityProvider, TokenRequest, wait_until_ready};
use crate::outcome::{AuthOutcome, INVALID_2FA_CODE, INVALID_RESPONSE, NO_ACTIVE_SESSION};
use crate::session::{Role, Session, SessionState, UserRecord};
use fawwerty_core::{AUTH_TOKEN_KEY, AppConfig, IdentityConfig, KeyValueStore, USER_KEY};
use fawwerty_http::auth_payload::refreshed_token;
use fawwerty_http::{ApiClient, ApiClientBuilder, AuthPayload, ClientError};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct SessionInner {
    user: Option<UserRecord>,
    requires_2fa: bool,
    pending_email: Option<String>,
}

#[derive(Clone, Copy)]
enum SocialFlow {
    Login,
    Signup,
}

impl SocialFlow {
    const fn failure(self) -> &'static str {
        match self {
            Self::Login => "Google login failed",
            Self::Signup => "Google signup failed",
        }
    }
}

/// Owner of the current session
///
/// The user lives here and the bearer token in the [`ApiClient`]; both are
/// mirrored to the durable store under `user` and `authToken`, and are set
/// or cleared together.
pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    state: Arc<RwLock<SessionInner>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    identity_config: IdentityConfig,
}

impl SessionManager {
    /// Build the client with `store` for token storage and restore any
    /// persisted session
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        builder: ApiClientBuilder,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let api = builder.token_store(Arc::clone(&store)).build()?;
        let state = Arc::new(RwLock::new(SessionInner::default()));

        {
            // A failed refresh inside the request pipeline ends the session
            let state = Arc::clone(&state);
            let store = Arc::clone(&store);
            api.on_auth_expired(move || {
                info!("Session expired, clearing stored user");
                clear_local(&state, store.as_ref());
            });
        }

        let manager = Self {
            api,
            store,
            state,
            identity: None,
            identity_config: IdentityConfig::default(),
        };
        manager.restore();
        Ok(manager)
    }

    /// Build from application configuration
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let mut manager = Self::new(ApiClientBuilder::from_config(&config.api), store)?;
        manager.identity_config = config.identity.clone();
        Ok(manager)
    }

    /// Attach the provider used by `google_login` and `google_signup`
    #[must_use]
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    #[must_use]
    pub fn with_identity_config(mut self, config: IdentityConfig) -> Self {
        self.identity_config = config;
        self
    }

    /// Client for resource endpoints, sharing this session's token
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Session {
        let inner = self.read();
        Session {
            user: inner.user.clone(),
            token: self.api.auth_token(),
            requires_2fa: inner.requires_2fa,
            pending_email: inner.pending_email.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    pub fn requires_2fa(&self) -> bool {
        self.read().requires_2fa
    }

    pub fn role(&self) -> Option<Role> {
        self.read().user.as_ref().and_then(UserRecord::role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_analyst(&self) -> bool {
        self.role() == Some(Role::Analyst)
    }

    pub fn is_client(&self) -> bool {
        self.role() == Some(Role::Client)
    }

    /// Password login
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        debug!("Logging in");
        let response = match self.api.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return AuthOutcome::failed(e.message());
            }
        };

        let payload = AuthPayload::from_response(&response);
        if payload.requires_2fa {
            // A second factor is pending for `email`; any previous session is over
            self.logout();
            let mut inner = self.write();
            inner.requires_2fa = true;
            inner.pending_email = Some(email.to_string());
            info!("Login requires second factor");
            return AuthOutcome::TwoFactorRequired;
        }

        self.complete(payload, INVALID_RESPONSE)
    }

    /// Verify the second-factor code for the pending login
    pub async fn verify_2fa(&self, code: &str) -> AuthOutcome {
        let email = self.read().pending_email.clone();
        match self.api.verify_2fa(code, email.as_deref()).await {
            Ok(response) => self.complete(AuthPayload::from_response(&response), INVALID_2FA_CODE),
            Err(e) if e.is_status() => {
                debug!(error = %e, "Second factor rejected");
                AuthOutcome::failed(INVALID_2FA_CODE)
            }
            Err(e) => AuthOutcome::failed(e.message()),
        }
    }

    /// Register an account
    ///
    /// A response without credentials is reported as
    /// [`AuthOutcome::Registered`] and leaves the session anonymous.
    pub async fn signup(&self, user_data: &Value) -> AuthOutcome {
        match self.api.register(user_data).await {
            Ok(response) => match AuthPayload::from_response(&response).into_credentials() {
                Some((token, user)) => self.persist_outcome(token, user),
                None => {
                    info!("Signup accepted without credentials");
                    AuthOutcome::Registered { data: response }
                }
            },
            Err(e) => AuthOutcome::failed(e.message()),
        }
    }

    pub async fn forgot_password(&self, email: &str) -> AuthOutcome {
        match self.api.forgot_password(email).await {
            Ok(_) => AuthOutcome::Completed,
            Err(e) => AuthOutcome::failed(e.message()),
        }
    }

    /// Exchange the current token for a new one; any failure logs out
    pub async fn refresh_token(&self) -> AuthOutcome {
        if self.read().user.is_none() || self.api.auth_token().is_none() {
            warn!("No active session to refresh, logging out");
            self.logout();
            return AuthOutcome::failed(NO_ACTIVE_SESSION);
        }

        let error = match self.api.refresh_token().await {
            Ok(response) => match refreshed_token(&response) {
                Some(token) => match self.api.set_auth_token(&token) {
                    Ok(()) => {
                        debug!("Token refreshed");
                        return AuthOutcome::Completed;
                    }
                    Err(e) => e.message(),
                },
                None => INVALID_RESPONSE.to_string(),
            },
            Err(e) => e.message(),
        };

        warn!(%error, "Token refresh failed, logging out");
        self.logout();
        AuthOutcome::failed(error)
    }

    /// End the session locally; never fails and needs no network
    pub fn logout(&self) {
        if let Err(e) = self.api.clear_auth_token() {
            warn!(error = %e, "Failed to remove stored token");
        }
        clear_local(&self.state, self.store.as_ref());
        debug!("Logged out");
    }

    pub async fn google_login(&self) -> AuthOutcome {
        self.social(SocialFlow::Login).await
    }

    pub async fn google_signup(&self) -> AuthOutcome {
        self.social(SocialFlow::Signup).await
    }

    async fn social(&self, flow: SocialFlow) -> AuthOutcome {
        let Some(provider) = &self.identity else {
            return AuthOutcome::failed(IdentityError::NotConfigured.to_string());
        };

        if let Err(e) =
            wait_until_ready(provider.status(), self.identity_config.ready_timeout()).await
        {
            warn!(error = %e, "Identity provider unavailable");
            return AuthOutcome::failed(e.to_string());
        }

        let request = TokenRequest {
            client_id: self.identity_config.google_client_id.clone(),
            scope: self.identity_config.scope.clone(),
        };
        let access_token = match provider.request_access_token(&request).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return AuthOutcome::failed(flow.failure()),
            Err(e) => return AuthOutcome::failed(e.to_string()),
        };

        let response = match flow {
            SocialFlow::Login => self.api.google_login(&access_token).await,
            SocialFlow::Signup => self.api.google_signup(&access_token).await,
        };
        match response {
            Ok(response) => self.complete(AuthPayload::from_response(&response), flow.failure()),
            Err(e) => AuthOutcome::failed(e.message()),
        }
    }

    fn complete(&self, payload: AuthPayload, missing: &str) -> AuthOutcome {
        match payload.into_credentials() {
            Some((token, user)) => self.persist_outcome(token, user),
            None => AuthOutcome::failed(missing),
        }
    }

    fn persist_outcome(&self, token: String, user: Map<String, Value>) -> AuthOutcome {
        match self.persist(&token, UserRecord::from(user)) {
            Ok(user) => {
                info!(role = ?user.role(), "Authenticated");
                AuthOutcome::Authenticated { user }
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist session");
                AuthOutcome::failed(e.message())
            }
        }
    }

    /// Store user and token durably, then publish them in memory
    fn persist(&self, token: &str, user: UserRecord) -> Result<UserRecord, ClientError> {
        let written = serde_json::to_string(&user)
            .map_err(ClientError::from)
            .and_then(|serialized| Ok(self.store.set(USER_KEY, &serialized)?))
            .and_then(|()| self.api.set_auth_token(token));

        if let Err(e) = written {
            // Never leave one half of the pair behind
            self.logout();
            return Err(e);
        }

        let mut inner = self.write();
        inner.user = Some(user.clone());
        inner.requires_2fa = false;
        inner.pending_email = None;
        Ok(user)
    }

    /// Load a persisted session; partial or unreadable state is discarded
    fn restore(&self) {
        let user = self.store.get(USER_KEY);
        let token = self.store.get(AUTH_TOKEN_KEY);

        match (user, token) {
            (Ok(Some(user)), Ok(Some(token))) => match serde_json::from_str::<UserRecord>(&user) {
                Ok(user) => {
                    if let Err(e) = self.api.set_auth_token(&token) {
                        warn!(error = %e, "Failed to restore token");
                        self.logout();
                        return;
                    }
                    info!(role = ?user.role(), "Restored session from storage");
                    self.write().user = Some(user);
                }
                Err(e) => {
                    warn!(error = %e, "Stored user is unreadable, clearing session");
                    self.logout();
                }
            },
            (Ok(None), Ok(None)) => {}
            (Ok(_), Ok(_)) => {
                warn!("Stored session is incomplete, clearing it");
                self.logout();
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to read stored session");
                self.logout();
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clear_local(state: &RwLock<SessionInner>, store: &dyn KeyValueStore) {
    *state.write().unwrap_or_else(PoisonError::into_inner) = SessionInner::default();
    if let Err(e) = store.remove(USER_KEY) {
        warn!(error = %e, "Failed to remove stored user");
    }
}
