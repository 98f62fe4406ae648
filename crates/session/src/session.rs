//! Session state types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role used for dashboard gating
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Analyst,
    Client,
}

impl Role {
    /// Parse a backend role name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Self::Admin),
            "analyst" => Some(Self::Analyst),
            "client" => Some(Self::Client),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Analyst => "analyst",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User as returned by the backend
///
/// The shape is owned by the backend; only `role` is interpreted here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn role(&self) -> Option<Role> {
        self.0.get("role").and_then(Value::as_str).and_then(Role::parse)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Lifecycle position of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    PendingTwoFactor,
    Authenticated,
}

/// Point-in-time view of the session
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<UserRecord>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    #[serde(rename = "requires2FA")]
    pub requires_2fa: bool,
    pub pending_email: Option<String>,
}

impl Session {
    pub const fn state(&self) -> SessionState {
        if self.user.is_some() {
            SessionState::Authenticated
        } else if self.requires_2fa {
            SessionState::PendingTwoFactor
        } else {
            SessionState::Anonymous
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(UserRecord::role)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: Value) -> UserRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_role_predicates() {
        let session = Session {
            user: Some(user(json!({"role": "analyst"}))),
            token: Some("t".into()),
            ..Session::default()
        };
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(session.is_analyst());
        assert!(!session.is_admin());
        assert!(!session.is_client());
    }

    #[test]
    fn test_unknown_role_grants_nothing() {
        let record = user(json!({"role": "superuser"}));
        assert_eq!(record.role(), None);
        assert_eq!(user(json!({"role": 1})).role(), None);
    }

    #[test]
    fn test_pending_two_factor_state() {
        let session = Session {
            requires_2fa: true,
            pending_email: Some("a@b.com".into()),
            ..Session::default()
        };
        assert_eq!(session.state(), SessionState::PendingTwoFactor);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_snapshot_serialization_hides_token() {
        let session = Session {
            user: Some(user(json!({"role": "client"}))),
            token: Some("secret".into()),
            ..Session::default()
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["user"]["role"], "client");
        assert_eq!(value["requires2FA"], false);
        assert!(value.get("token").is_none());
    }

    #[test]
    fn test_user_record_round_trips_as_plain_object() {
        let record = user(json!({"id": 3, "role": "admin", "email": "x@y.z"}));
        assert_eq!(record.email(), Some("x@y.z"));
        let serialized = serde_json::to_string(&record).unwrap();
        let plain: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(plain, json!({"id": 3, "role": "admin", "email": "x@y.z"}));
        assert_eq!(serde_json::from_str::<UserRecord>(&serialized).unwrap(), record);
    }
}
