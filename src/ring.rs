//! Consistent hash ring with virtual nodes.
//!
//! Owners are placed `replicas` times, evenly spaced across the 32-bit hash
//! space starting from the hash of their URL. Lookups walk clockwise to the
//! first virtual node at or after the key hash, wrapping to the start.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Hash function mapping bytes onto the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default number of virtual nodes per owner on the instance side.
pub const DEFAULT_REPLICAS: usize = 100;

/// FNV-1a, 32-bit.
pub fn fnv1a(data: &[u8]) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual nodes: position -> owner
    ring: BTreeMap<u32, String>,
    /// Reverse map used for removal: owner -> positions
    owners: HashMap<String, Vec<u32>>,
}

impl HashRing {
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, fnv1a)
    }

    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas: replicas.max(1),
            ring: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds owners to the ring. Owners already present are left untouched.
    pub fn set<I, S>(&mut self, owners: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let step = u32::MAX / self.replicas as u32;
        for owner in owners {
            let owner = owner.into();
            if self.owners.contains_key(&owner) {
                continue;
            }

            let mut base = (self.hash)(owner.as_bytes());
            let mut attempt: u32 = 0;
            while self.collides(base, step) {
                // Deterministic perturbation: rehash owner with a salt
                attempt += 1;
                base = (self.hash)(format!("{owner}#{attempt}").as_bytes());
            }

            let positions: Vec<u32> = (0..self.replicas as u32)
                .map(|i| base.wrapping_add(step.wrapping_mul(i)))
                .collect();
            for position in &positions {
                self.ring.insert(*position, owner.clone());
            }
            self.owners.insert(owner, positions);
        }
    }

    /// Owner of `key`, or None on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        self.ring
            .range(hash..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, owner)| owner.as_str())
    }

    /// Deletes every virtual node of `owner`. Returns false if it was absent.
    pub fn remove_by_url(&mut self, owner: &str) -> bool {
        match self.owners.remove(owner) {
            Some(positions) => {
                for position in positions {
                    self.ring.remove(&position);
                }
                true
            }
            None => false,
        }
    }

    /// Owners de-duplicated by first occurrence walking the sorted ring.
    pub fn owners_in_ring_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ring
            .values()
            .filter(|owner| seen.insert(owner.as_str()))
            .cloned()
            .collect()
    }

    pub fn contains(&self, owner: &str) -> bool {
        self.owners.contains_key(owner)
    }

    /// Number of distinct owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn virtual_node_count(&self) -> usize {
        self.ring.len()
    }

    fn collides(&self, base: u32, step: u32) -> bool {
        (0..self.replicas as u32)
            .any(|i| self.ring.contains_key(&base.wrapping_add(step.wrapping_mul(i))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn test_ring_empty_returns_none() {
        let ring = HashRing::new(5);
        assert_eq!(ring.get("any-key"), None);
        assert!(ring.owners_in_ring_order().is_empty());
    }

    #[test]
    fn test_ring_clockwise_lookup_with_custom_hash() {
        // One replica per owner keeps positions equal to the owner's number
        let mut ring = HashRing::with_hasher(1, numeric_hash);
        ring.set(["10", "20", "30"]);

        assert_eq!(ring.get("5"), Some("10"));
        assert_eq!(ring.get("10"), Some("10"));
        assert_eq!(ring.get("11"), Some("20"));
        assert_eq!(ring.get("25"), Some("30"));
        // Past the last node wraps to the first
        assert_eq!(ring.get("31"), Some("10"));
    }

    #[test]
    fn test_ring_replicas_spaced_across_space() {
        let mut ring = HashRing::with_hasher(4, numeric_hash);
        ring.set(["0"]);

        let step = u32::MAX / 4;
        assert_eq!(ring.virtual_node_count(), 4);
        assert_eq!(ring.get(&(step - 1).to_string()), Some("0"));
        assert_eq!(ring.owners_in_ring_order(), vec!["0"]);
    }

    #[test]
    fn test_ring_collision_is_perturbed() {
        // Every owner hashes to 0 on first try
        fn colliding(data: &[u8]) -> u32 {
            if data.contains(&b'#') {
                fnv1a(data)
            } else {
                0
            }
        }
        let mut ring = HashRing::with_hasher(3, colliding);
        ring.set(["a", "b"]);

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.virtual_node_count(), 6);
    }

    #[test]
    fn test_ring_get_is_deterministic() {
        let mut ring = HashRing::new(50);
        ring.set(["http://a:1", "http://b:2", "http://c:3"]);

        for i in 0..200 {
            let key = format!("key-{i}");
            let first = ring.get(&key).map(str::to_string);
            assert_eq!(ring.get(&key).map(str::to_string), first);
        }
    }

    #[test]
    fn test_ring_remove_by_url_unmaps_owner() {
        let mut ring = HashRing::new(50);
        ring.set(["http://a:1", "http://b:2", "http://c:3"]);

        assert!(ring.remove_by_url("http://b:2"));
        assert!(!ring.remove_by_url("http://b:2"));
        assert_eq!(ring.virtual_node_count(), 100);

        for i in 0..1000 {
            let key = format!("key-{i}");
            assert_ne!(ring.get(&key), Some("http://b:2"));
        }
    }

    #[test]
    fn test_ring_same_membership_same_order() {
        let mut ring1 = HashRing::new(10);
        ring1.set(["http://a:1", "http://b:2", "http://c:3"]);

        let mut ring2 = HashRing::new(10);
        ring2.set(["http://c:3"]);
        ring2.set(["http://a:1", "http://b:2"]);

        assert_eq!(ring1.owners_in_ring_order(), ring2.owners_in_ring_order());
        assert_eq!(ring1.owners_in_ring_order().len(), 3);
        for i in 0..200 {
            let key = format!("user:{i}");
            assert_eq!(ring1.get(&key), ring2.get(&key));
        }
    }

    #[test]
    fn test_ring_set_is_idempotent() {
        let mut ring = HashRing::new(5);
        ring.set(["http://a:1"]);
        ring.set(["http://a:1"]);

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.virtual_node_count(), 5);
    }
}
