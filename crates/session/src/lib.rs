//! Session store for the Fawwerty client
//!
//! [`SessionManager`] is the single owner of "who is logged in". It is
//! constructed once with a durable [`fawwerty_core::KeyValueStore`], restores
//! any persisted session, and converts every transport failure into an
//! [`AuthOutcome`] so callers never see an error from an auth operation.

pub mod identity;
pub mod manager;
pub mod outcome;
pub mod session;

pub use identity::{IdentityError, IdentityProvider, SdkStatus, StaticTokenProvider, TokenRequest};
pub use manager::SessionManager;
pub use outcome::AuthOutcome;
pub use session::{Role, Session, SessionState, UserRecord};
