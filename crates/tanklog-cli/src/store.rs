//! Keychain-backed token storage for CLI profiles.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use tanklog_core::error::{Error, Result};
use tanklog_core::store::TokenStore;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "tanklog-cli";

/// [`TokenStore`] holding one keychain entry per stored key per profile.
///
/// Tests swap the keychain for a process-local map so they run without a
/// platform secret service.
#[derive(Clone)]
pub struct KeyringTokenStore {
    profile: String,
}

impl KeyringTokenStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            profile: profile_name.to_string(),
        }
    }

    fn entry_name(&self, key: &str) -> String {
        format!("{key}:{}", self.profile)
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.entry_name(key))
            .map_err(|error| Error::SecureStorage(error.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    #[cfg(not(test))]
    fn load(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(Error::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load(&self, key: &str) -> Result<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        Ok(guard.get(&self.entry_name(key)).cloned())
    }

    #[cfg(not(test))]
    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|error| Error::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        guard.insert(self.entry_name(key), value.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(Error::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn delete(&self, key: &str) -> Result<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| Error::SecureStorage(error.to_string()))?;
        guard.remove(&self.entry_name(key));
        Ok(())
    }
}
