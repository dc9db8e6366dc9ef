//! Authentication module for managing the signed-in user.
//!
//! This module provides:
//! - `KeyValueStore`: the persistent store the session survives restarts in,
//!   with file, OS keychain and in-memory backends
//! - `SessionManager`: login, registration and logout against the remote API
//!
//! The session is persisted as the serialized user under the `user` key.

pub mod session;
pub mod store;

pub use session::{SessionManager, SESSION_KEY};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
