//! Secure token storage abstraction.
//!
//! The backend session is persisted as three independent string entries:
//! the access token, the refresh token, and the JSON-serialized user object.
//! Platform frontends supply a keychain-backed implementation; tests use
//! [`MemoryTokenStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Storage key for the bearer access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the JSON-serialized user object.
pub const USER_DATA_KEY: &str = "user_data";

/// All keys that make up a persisted session.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY];

/// Platform-provided encrypted key/value storage for credentials.
///
/// Writes are awaited by callers and their failures propagate; the session
/// state never claims a condition the store does not reflect. Deleting an
/// absent key is not an error.
pub trait TokenStore: Clone + Send + Sync + 'static {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;

    /// Delete every persisted session key.
    fn clear_session(&self) -> Result<()> {
        for key in SESSION_KEYS {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Load the stored access token, if any.
    fn access_token(&self) -> Result<Option<String>> {
        self.load(ACCESS_TOKEN_KEY)
    }
}

/// In-memory [`TokenStore`] used by tests and short-lived tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        store.save(ACCESS_TOKEN_KEY, "token").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("token"));
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let store = MemoryTokenStore::new();
        assert!(store.delete("never-saved").is_ok());
    }

    #[test]
    fn clear_session_removes_every_key() {
        let store = MemoryTokenStore::new();
        for key in SESSION_KEYS {
            store.save(key, "value").unwrap();
        }
        store.clear_session().unwrap();
        for key in SESSION_KEYS {
            assert_eq!(store.load(key).unwrap(), None);
        }
    }
}
