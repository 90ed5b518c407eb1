//! LRU List Module
//!
//! Implements constant-time Least Recently Used ordering for cache eviction.

// == Slot ==
/// Stable handle to a key's position in an [`LruList`].
pub type Slot = usize;

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<Slot>,
    next: Option<Slot>,
}

// == LRU List ==
/// Doubly linked recency list stored in a slab.
///
/// - Front (head) = Most recently used
/// - Back (tail) = Least recently used
///
/// Every operation is O(1). Freed slots are recycled, so a [`Slot`] is only
/// valid until the key it was issued for is removed.
#[derive(Debug, Default)]
pub struct LruList {
    nodes: Vec<Option<Node>>,
    free: Vec<Slot>,
    head: Option<Slot>,
    tail: Option<Slot>,
    len: usize,
}

impl LruList {
    // == Constructor ==
    /// Creates a new empty LRU list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Front ==
    /// Inserts a key as most recently used and returns its slot.
    pub fn push_front(&mut self, key: String) -> Slot {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link_front(slot);
        self.len += 1;
        slot
    }

    // == Move To Front ==
    /// Marks the key at `slot` as recently used.
    pub fn move_to_front(&mut self, slot: Slot) {
        if self.head == Some(slot) || self.node(slot).is_none() {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    // == Remove ==
    /// Removes the key at `slot`, returning it.
    pub fn remove(&mut self, slot: Slot) -> Option<String> {
        self.node(slot)?;
        self.unlink(slot);
        let node = self.nodes[slot].take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.key)
    }

    // == Pop Back ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<String> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Peek Back ==
    /// Returns the least recently used key without removing it.
    pub fn peek_back(&self) -> Option<&str> {
        self.tail
            .and_then(|slot| self.node(slot))
            .map(|node| node.key.as_str())
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Keys ==
    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.head;
        while let Some(slot) = cur {
            match self.node(slot) {
                Some(node) => {
                    out.push(node.key.as_str());
                    cur = node.next;
                }
                None => break,
            }
        }
        out
    }

    fn node(&self, slot: Slot) -> Option<&Node> {
        self.nodes.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: Slot) -> Option<&mut Node> {
        self.nodes.get_mut(slot).and_then(Option::as_mut)
    }

    fn unlink(&mut self, slot: Slot) {
        let (prev, next) = match self.node(slot) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    fn link_front(&mut self, slot: Slot) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.node_mut(h) {
                node.prev = Some(slot);
            }
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruList::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_back(), None);
    }

    #[test]
    fn test_push_front_orders_newest_first() {
        let mut lru = LruList::new();
        lru.push_front("key1".into());
        lru.push_front("key2".into());
        lru.push_front("key3".into());

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.keys(), vec!["key3", "key2", "key1"]);
        assert_eq!(lru.peek_back(), Some("key1"));
    }

    #[test]
    fn test_move_to_front() {
        let mut lru = LruList::new();
        let a = lru.push_front("a".into());
        lru.push_front("b".into());
        lru.push_front("c".into());

        lru.move_to_front(a);

        assert_eq!(lru.keys(), vec!["a", "c", "b"]);
        assert_eq!(lru.peek_back(), Some("b"));
    }

    #[test]
    fn test_move_middle_to_front() {
        let mut lru = LruList::new();
        lru.push_front("a".into());
        let b = lru.push_front("b".into());
        lru.push_front("c".into());

        lru.move_to_front(b);
        assert_eq!(lru.keys(), vec!["b", "c", "a"]);

        // Head stays put when touched again
        lru.move_to_front(b);
        assert_eq!(lru.keys(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_pop_back_evicts_oldest() {
        let mut lru = LruList::new();
        lru.push_front("key1".into());
        lru.push_front("key2".into());

        assert_eq!(lru.pop_back(), Some("key1".to_string()));
        assert_eq!(lru.pop_back(), Some("key2".to_string()));
        assert_eq!(lru.pop_back(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_remove_middle_relinks() {
        let mut lru = LruList::new();
        lru.push_front("a".into());
        let b = lru.push_front("b".into());
        lru.push_front("c".into());

        assert_eq!(lru.remove(b), Some("b".to_string()));
        assert_eq!(lru.keys(), vec!["c", "a"]);
        assert_eq!(lru.len(), 2);

        // Removing twice is a no-op
        assert_eq!(lru.remove(b), None);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut lru = LruList::new();
        let a = lru.push_front("a".into());
        lru.remove(a);
        let b = lru.push_front("b".into());

        assert_eq!(a, b);
        assert_eq!(lru.keys(), vec!["b"]);
        assert_eq!(lru.peek_back(), Some("b"));
    }
}
