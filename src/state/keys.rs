//! Per-request key registry: integer key-id to [`KeyEntry`].

use crate::keys::KeyEntry;
use std::collections::HashMap;

/// Maps integer key-ids, strictly increasing from 1 within one request, to
/// imported/generated key material.
#[derive(Default)]
pub struct KeyRegistry {
    keys: HashMap<u64, KeyEntry>,
    next_id: u64,
}

impl KeyRegistry {
    /// Creates an empty registry; the first key inserted gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            next_id: 1,
        }
    }

    /// Inserts `entry`, returning its newly-assigned key-id.
    pub fn insert(&mut self, entry: KeyEntry) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.keys.insert(id, entry);
        id
    }

    /// Looks up a key by id, scoped to this request only.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&KeyEntry> {
        self.keys.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyType;

    fn dummy_key() -> KeyEntry {
        KeyEntry::secret(vec![1, 2, 3], "HMAC", Some("SHA-256".into()), true)
    }

    #[test]
    fn ids_are_strictly_increasing_from_one() {
        let mut registry = KeyRegistry::new();
        assert_eq!(registry.insert(dummy_key()), 1);
        assert_eq!(registry.insert(dummy_key()), 2);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let registry = KeyRegistry::new();
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn get_returns_the_inserted_entry() {
        let mut registry = KeyRegistry::new();
        let id = registry.insert(dummy_key());
        assert_eq!(registry.get(id).unwrap().key_type, KeyType::Secret);
    }
}
