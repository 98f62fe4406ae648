//! Authentication API client methods
//!
//! Responses are returned as raw JSON; [`crate::AuthPayload`] maps them to
//! credentials.

use super::{ApiClient, ClientError, RequestOptions};
use crate::types::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, SocialTokenRequest,
    VerifyTwoFactorRequest,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

fn post<T: Serialize>(body: &T) -> Result<RequestOptions, ClientError> {
    Ok(RequestOptions::with_body(
        Method::POST,
        serde_json::to_value(body)?,
    ))
}

impl ApiClient {
    /// Password login
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request("/auth/login", post(&body)?).await
    }

    /// Register a new account; the body is forwarded as given
    pub async fn register(&self, user_data: &Value) -> Result<Value, ClientError> {
        self.request("/auth/register", RequestOptions::post(user_data.clone()))
            .await
    }

    /// Ask the backend to send a password reset
    pub async fn forgot_password(&self, email: &str) -> Result<Value, ClientError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.request("/auth/forgot-password", post(&body)?).await
    }

    /// Verify a second-factor code for the account identified by `email`
    pub async fn verify_2fa(
        &self,
        code: &str,
        email: Option<&str>,
    ) -> Result<Value, ClientError> {
        let body = VerifyTwoFactorRequest {
            token: code.to_string(),
            email: email.map(str::to_owned),
        };
        self.request("/auth/verify2fa", post(&body)?).await
    }

    /// Exchange the current token for a new one
    ///
    /// Sent directly rather than through [`ApiClient::request`] so a refresh
    /// can never recurse into another refresh.
    pub async fn refresh_token(&self) -> Result<Value, ClientError> {
        let options = post(&RefreshRequest {
            token: self.auth_token(),
        })?;
        let response = self.send(&self.url("/auth/refresh"), &options, None).await?;
        Self::decode(response).await
    }

    /// Log in with a Google access token
    pub async fn google_login(&self, access_token: &str) -> Result<Value, ClientError> {
        let body = SocialTokenRequest {
            token: access_token.to_string(),
        };
        self.request("/auth/google-login", post(&body)?).await
    }

    /// Sign up with a Google access token
    pub async fn google_signup(&self, access_token: &str) -> Result<Value, ClientError> {
        let body = SocialTokenRequest {
            token: access_token.to_string(),
        };
        self.request("/auth/google-signup", post(&body)?).await
    }
}
