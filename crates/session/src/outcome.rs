//! Results of session operations

use crate::session::UserRecord;
use serde_json::{Value, json};

/// Message used when a 2xx response lacks usable credentials
pub const INVALID_RESPONSE: &str = "Invalid response from server";

/// Message used for any rejected second-factor code
pub const INVALID_2FA_CODE: &str = "Invalid 2FA code";

pub const NO_ACTIVE_SESSION: &str = "No active session";

/// Result of a session operation; failures are values, never errors
#[derive(Clone, Debug, PartialEq)]
pub enum AuthOutcome {
    /// Credentials were accepted and persisted
    Authenticated { user: UserRecord },

    /// Password accepted; a second-factor code must be verified next
    TwoFactorRequired,

    /// Signup accepted without issuing credentials (e.g. email verification
    /// pending); the raw response is kept for the caller
    Registered { data: Value },

    /// The operation succeeded and carries no payload
    Completed,

    Failed { error: String },
}

impl AuthOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub const fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    /// Short machine-readable name of the outcome kind
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authenticated { .. } => "authenticated",
            Self::TwoFactorRequired => "two_factor_required",
            Self::Registered { .. } => "registered",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// `{success, ...}` object in the shape dashboards already consume
    pub fn to_json(&self) -> Value {
        let mut value = match self {
            Self::Authenticated { user } => json!({"success": true, "user": user}),
            Self::TwoFactorRequired => json!({"success": true, "requires2FA": true}),
            Self::Registered { data } => json!({"success": true, "data": data}),
            Self::Completed => json!({"success": true}),
            Self::Failed { error } => json!({"success": false, "error": error}),
        };
        value["outcome"] = Value::from(self.kind());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_json_shapes() {
        let user: UserRecord = serde_json::from_value(json!({"role": "client"})).unwrap();
        assert_eq!(
            AuthOutcome::Authenticated { user }.to_json(),
            json!({"success": true, "user": {"role": "client"}, "outcome": "authenticated"})
        );
        assert_eq!(
            AuthOutcome::TwoFactorRequired.to_json()["requires2FA"],
            true
        );
        assert_eq!(
            AuthOutcome::failed(INVALID_2FA_CODE).to_json(),
            json!({"success": false, "error": "Invalid 2FA code", "outcome": "failed"})
        );
    }

    #[test]
    fn test_registered_is_distinct_from_authenticated() {
        let outcome = AuthOutcome::Registered {
            data: json!({"message": "Check your inbox"}),
        };
        assert!(outcome.is_success());
        assert!(outcome.user().is_none());
        assert_eq!(outcome.kind(), "registered");
    }
}
