//! Concurrent maps of generic method instantiations.
//!
//! [`InstantiationMap`] backs both the completed-instantiation cache and the pending set
//! of a [`crate::runtime::GenericMethodCache`]. Reads take a shared lock on one shard,
//! writes an exclusive lock on one shard, so lookups of unrelated keys never contend with
//! an insertion. A key that has not been added yet behaves as a miss.

use dashmap::DashMap;

use crate::metadata::method::{GenericMethod, GenericMethodRc, InflatedMethodRc};

/// Map from instantiation key to realized descriptor
#[derive(Default)]
pub struct InstantiationMap {
    entries: DashMap<GenericMethodRc, InflatedMethodRc>,
}

impl InstantiationMap {
    /// Create an empty map
    pub fn new() -> Self {
        InstantiationMap {
            entries: DashMap::new(),
        }
    }

    /// Look up the descriptor for a key
    ///
    /// ## Arguments
    /// * `key` - The instantiation to look up
    pub fn try_get(&self, key: &GenericMethod) -> Option<InflatedMethodRc> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert a descriptor, replacing any previous entry for the key
    ///
    /// ## Arguments
    /// * `key`     - The instantiation, stored for the lifetime of the entry
    /// * `method`  - The descriptor
    pub fn add(&self, key: GenericMethodRc, method: InflatedMethodRc) {
        self.entries.insert(key, method);
    }

    /// Remove the entry for a key, returning its descriptor
    pub fn remove(&self, key: &GenericMethod) -> Option<InflatedMethodRc> {
        self.entries.remove(key).map(|(_, method)| method)
    }

    /// Returns `true` if the key has an entry
    pub fn contains(&self, key: &GenericMethod) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry. Must not race with lookups or insertions.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
