// Persisted string collections: favorites and recent searches
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::storage::Storage;
use crate::{Error, Result};

pub const FAVORITES_KEY: &str = "supplement-favorites";
pub const RECENT_SEARCHES_KEY: &str = "supplement-recent-searches";
pub const MAX_RECENT_SEARCHES: usize = 10;

/// How a collection treats an added value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Unique values in insertion order, no cap
    Set,
    /// Most recent first, case-insensitive dedup, capped
    Mru { capacity: usize },
}

impl MergePolicy {
    /// Whether a stored item counts as `value` under this policy
    fn matches(&self, item: &str, value: &str) -> bool {
        match *self {
            MergePolicy::Set => item == value,
            MergePolicy::Mru { .. } => item.to_lowercase() == value.trim().to_lowercase(),
        }
    }

    fn insert(&self, items: &mut Vec<String>, value: &str) {
        match *self {
            MergePolicy::Set => {
                if !items.iter().any(|item| item == value) {
                    items.push(value.to_string());
                }
            }
            MergePolicy::Mru { capacity } => {
                let value = value.trim();
                if value.is_empty() {
                    return;
                }

                let lowered = value.to_lowercase();
                items.retain(|item| item.to_lowercase() != lowered);
                items.insert(0, value.to_string());
                items.truncate(capacity);
            }
        }
    }
}

/// Ordered strings kept in sync with one storage key
///
/// Loaded once on creation; unreadable stored data is logged and treated as
/// empty. Every mutation writes the full list back before returning.
pub struct PersistentCollection {
    key: String,
    policy: MergePolicy,
    items: Vec<String>,
    storage: Arc<dyn Storage>,
}

impl PersistentCollection {
    pub fn load(storage: Arc<dyn Storage>, key: &str, policy: MergePolicy) -> Self {
        let items = match read_items(storage.as_ref(), key) {
            Ok(items) => items,
            Err(err) => {
                warn!("Starting {} empty: {}", key, err);
                Vec::new()
            }
        };
        debug!("Loaded {} entries from {}", items.len(), key);

        Self {
            key: key.to_string(),
            policy,
            items,
            storage,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Exact for `Set`; trimmed and case-insensitive for `Mru`
    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| self.policy.matches(item, value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, value: &str) {
        self.policy.insert(&mut self.items, value);
        self.persist();
    }

    /// Drop exact matches
    pub fn remove(&mut self, value: &str) {
        self.items.retain(|item| item != value);
        self.persist();
    }

    /// Remove if present, add otherwise; returns whether `value` is now present
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.contains(value) {
            let policy = self.policy;
            self.items.retain(|item| !policy.matches(item, value));
        } else {
            self.policy.insert(&mut self.items, value);
        }
        self.persist();
        self.contains(value)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        // Memory already holds the new list; a failed write only costs durability
        let result = serde_json::to_string(&self.items)
            .map_err(Error::from)
            .and_then(|json| self.storage.set(&self.key, &json));

        if let Err(err) = result {
            error!("Failed to write {}: {}", self.key, err);
        }
    }
}

fn read_items(storage: &dyn Storage, key: &str) -> Result<Vec<String>> {
    let Some(raw) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    serde_json::from_str(&raw).map_err(|e| Error::MalformedPersistedData {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Favorite supplement ids
pub struct Favorites {
    inner: PersistentCollection,
}

impl Favorites {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: PersistentCollection::load(storage, FAVORITES_KEY, MergePolicy::Set),
        }
    }

    pub fn items(&self) -> &[String] {
        self.inner.items()
    }

    pub fn add(&mut self, id: &str) {
        self.inner.add(id);
    }

    pub fn remove(&mut self, id: &str) {
        self.inner.remove(id);
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        self.inner.toggle(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

/// Recent search queries, most recent first
pub struct RecentSearches {
    inner: PersistentCollection,
}

impl RecentSearches {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        Self::with_capacity(storage, MAX_RECENT_SEARCHES)
    }

    pub fn with_capacity(storage: Arc<dyn Storage>, capacity: usize) -> Self {
        Self {
            inner: PersistentCollection::load(
                storage,
                RECENT_SEARCHES_KEY,
                MergePolicy::Mru { capacity },
            ),
        }
    }

    pub fn items(&self) -> &[String] {
        self.inner.items()
    }

    pub fn add(&mut self, query: &str) {
        self.inner.add(query);
    }

    /// Drop one entry, matched exactly
    pub fn remove(&mut self, query: &str) {
        self.inner.remove(query);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        match self.inner.policy() {
            MergePolicy::Mru { capacity } => capacity,
            MergePolicy::Set => usize::MAX,
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
