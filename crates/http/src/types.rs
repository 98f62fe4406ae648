//! Request bodies sent to the auth endpoints

use serde::{Deserialize, Serialize};

/// Password login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Second-factor verification; the backend expects the code under `token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTwoFactorRequest {
    pub token: String,
    pub email: Option<String>,
}

/// Token refresh request carrying the current token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub token: Option<String>,
}

/// Social login/signup request carrying the provider's access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialTokenRequest {
    pub token: String,
}
