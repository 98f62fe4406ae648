//! Fawwerty client core types and utilities

pub mod config;
pub mod error;
pub mod state_dir;
pub mod storage;

pub use config::{ApiConfig, AppConfig, IdentityConfig, StorageConfig};
pub use error::{CoreError, CoreResult};
pub use state_dir::StateDir;
pub use storage::{AUTH_TOKEN_KEY, FileStore, KeyValueStore, MemoryStore, USER_KEY};
