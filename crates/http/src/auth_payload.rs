//! Mapping from auth endpoint responses to credentials
//!
//! The backend has not settled on one envelope for credential responses, so
//! every accepted shape is listed here and nowhere else:
//!
//! - token: `token`, `access_token`, `data.token`, `data.access_token`
//! - user: `user`, `data.user`, `data.userData`, or `data` itself
//! - two-factor flag: `requires2FA`, top level or under `data`
//!
//! Only non-empty string tokens and JSON object users count.

use serde_json::{Map, Value};

/// Credentials extracted from an auth endpoint response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthPayload {
    pub token: Option<String>,
    pub user: Option<Map<String, Value>>,
    pub requires_2fa: bool,
}

impl AuthPayload {
    pub fn from_response(response: &Value) -> Self {
        let data = response.get("data");

        let token = token_at(response, "token")
            .or_else(|| token_at(response, "access_token"))
            .or_else(|| data.and_then(|d| token_at(d, "token")))
            .or_else(|| data.and_then(|d| token_at(d, "access_token")));

        let user = object_at(response, "user")
            .or_else(|| data.and_then(|d| object_at(d, "user")))
            .or_else(|| data.and_then(|d| object_at(d, "userData")))
            .or_else(|| data.and_then(Value::as_object).cloned());

        let requires_2fa = flag_at(response, "requires2FA")
            || data.is_some_and(|d| flag_at(d, "requires2FA"));

        Self {
            token,
            user,
            requires_2fa,
        }
    }

    /// Token and user together, or nothing
    pub fn into_credentials(self) -> Option<(String, Map<String, Value>)> {
        match (self.token, self.user) {
            (Some(token), Some(user)) => Some((token, user)),
            _ => None,
        }
    }
}

/// Token returned by the refresh endpoint (`token` or `access_token`)
pub fn refreshed_token(response: &Value) -> Option<String> {
    token_at(response, "token").or_else(|| token_at(response, "access_token"))
}

fn token_at(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn object_at(value: &Value, key: &str) -> Option<Map<String, Value>> {
    value.get(key).and_then(Value::as_object).cloned()
}

fn flag_at(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_token_and_user() {
        let payload = AuthPayload::from_response(&json!({
            "token": "t1",
            "user": {"role": "client"}
        }));
        let (token, user) = payload.into_credentials().unwrap();
        assert_eq!(token, "t1");
        assert_eq!(user["role"], "client");
    }

    #[test]
    fn test_nested_data_envelope() {
        let payload = AuthPayload::from_response(&json!({
            "data": {"access_token": "t2", "userData": {"role": "admin"}}
        }));
        assert_eq!(payload.token.as_deref(), Some("t2"));
        assert_eq!(payload.user.unwrap()["role"], "admin");
    }

    #[test]
    fn test_data_object_is_the_user_of_last_resort() {
        let payload = AuthPayload::from_response(&json!({
            "access_token": "t3",
            "data": {"id": 7, "role": "analyst"}
        }));
        let (_, user) = payload.into_credentials().unwrap();
        assert_eq!(user["id"], 7);
    }

    #[test]
    fn test_top_level_keys_win_over_nested() {
        let payload = AuthPayload::from_response(&json!({
            "token": "outer",
            "user": {"role": "client"},
            "data": {"token": "inner", "user": {"role": "admin"}}
        }));
        assert_eq!(payload.token.as_deref(), Some("outer"));
        assert_eq!(payload.user.unwrap()["role"], "client");
    }

    #[test]
    fn test_empty_token_and_scalar_user_are_rejected() {
        let payload = AuthPayload::from_response(&json!({
            "token": "",
            "user": "alice"
        }));
        assert_eq!(payload.token, None);
        assert_eq!(payload.user, None);
        assert!(payload.into_credentials().is_none());
    }

    #[test]
    fn test_two_factor_flag() {
        assert!(AuthPayload::from_response(&json!({"requires2FA": true})).requires_2fa);
        assert!(AuthPayload::from_response(&json!({"data": {"requires2FA": true}})).requires_2fa);
        assert!(!AuthPayload::from_response(&json!({"requires2FA": "yes"})).requires_2fa);
        assert!(!AuthPayload::from_response(&json!(null)).requires_2fa);
    }

    #[test]
    fn test_refresh_token_shapes() {
        assert_eq!(refreshed_token(&json!({"token": "a"})).as_deref(), Some("a"));
        assert_eq!(
            refreshed_token(&json!({"access_token": "b"})).as_deref(),
            Some("b")
        );
        assert_eq!(refreshed_token(&json!({"data": {"token": "c"}})), None);
    }
}
