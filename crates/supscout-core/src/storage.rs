// Durable key/value port used by the persisted collections
use std::collections::HashMap;
use std::sync::Mutex;

use supscout_cache::KeyValueStore;

use crate::Result;

/// Minimal string key/value storage
///
/// Each write replaces the whole value for its key.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process storage, gone when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, handy for testing recovery from bad data
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.lock().insert(key.to_string(), value.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

impl Storage for KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(KeyValueStore::get(self, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(KeyValueStore::set(self, key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        KeyValueStore::remove(self, key)?;
        Ok(())
    }
}
