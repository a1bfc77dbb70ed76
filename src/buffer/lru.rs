//! LRU (Least Recently Used) cache implementation.

use std::collections::HashMap;
use std::hash::Hash;

/// A fixed-capacity map that evicts its least recently used entry.
///
/// Both `get` and `put` count as a use.
pub struct LruCache<K, V> {
    capacity: usize,
    /// Maps a key to its node in `order`
    positions: HashMap<K, usize>,
    /// Doubly-linked list nodes for O(1) removal
    order: Vec<LruNode<K, V>>,
    /// Head of the list (most recently used)
    head: Option<usize>,
    /// Tail of the list (least recently used)
    tail: Option<usize>,
    /// Free list of node indices
    free_slots: Vec<usize>,
}

struct LruNode<K, V> {
    entry: Option<(K, V)>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Create a new LRU cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            positions: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_slots: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Look up a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        self.move_to_front(pos);
        self.order[pos].entry.as_ref().map(|(_, v)| v)
    }

    /// Look up a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        self.order[pos].entry.as_ref().map(|(_, v)| v)
    }

    /// Insert or update a value, marking it most recently used. Inserting a
    /// new key into a full cache evicts and returns the LRU entry.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&pos) = self.positions.get(&key) {
            self.order[pos].entry = Some((key, value));
            self.move_to_front(pos);
            return None;
        }

        let evicted = if self.positions.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };
        self.insert(key, value);
        evicted
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.positions.remove(key)?;
        self.unlink(pos);
        self.free_slots.push(pos);
        self.order[pos].entry.take().map(|(_, v)| v)
    }

    /// Get the least recently used key
    pub fn lru(&self) -> Option<&K> {
        self.tail
            .and_then(|pos| self.order[pos].entry.as_ref())
            .map(|(k, _)| k)
    }

    /// Pop the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let key = self.lru()?.clone();
        let value = self.remove(&key)?;
        Some((key, value))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.positions.clear();
        self.order.clear();
        self.free_slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Insert a new entry at the front
    fn insert(&mut self, key: K, value: V) {
        let node = LruNode {
            entry: Some((key.clone(), value)),
            prev: None,
            next: self.head,
        };
        let pos = if let Some(pos) = self.free_slots.pop() {
            self.order[pos] = node;
            pos
        } else {
            self.order.push(node);
            self.order.len() - 1
        };

        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);

        if self.tail.is_none() {
            self.tail = Some(pos);
        }

        self.positions.insert(key, pos);
    }

    /// Move a node to the front of the list
    fn move_to_front(&mut self, pos: usize) {
        if self.head == Some(pos) {
            return;
        }

        self.unlink(pos);

        self.order[pos].prev = None;
        self.order[pos].next = self.head;

        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);

        if self.tail.is_none() {
            self.tail = Some(pos);
        }
    }

    /// Unlink a node from the list
    fn unlink(&mut self, pos: usize) {
        let (prev, next) = (self.order[pos].prev, self.order[pos].next);

        if let Some(prev) = prev {
            self.order[prev].next = next;
        } else {
            self.head = next;
        }

        if let Some(next) = next {
            self.order[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        assert!(cache.put(1, "a").is_none());
        assert!(cache.put(2, "b").is_none());
        assert_eq!(cache.get(&1), Some(&"a"));

        assert_eq!(cache.put(3, "c"), Some((2, "b")));
        assert!(cache.contains(&1));
        assert!(cache.contains(&3));
        assert!(!cache.contains(&2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_order() {
        let mut cache = LruCache::new(3);

        cache.put(1, ());
        cache.put(2, ());
        cache.put(3, ());

        assert_eq!(cache.lru(), Some(&1));

        cache.get(&1);
        assert_eq!(cache.lru(), Some(&2));

        assert_eq!(cache.pop_lru(), Some((2, ())));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_update_existing_key_does_not_evict() {
        let mut cache = LruCache::new(2);
        cache.put("x", 1);
        cache.put("y", 2);
        assert!(cache.put("x", 10).is_none());
        assert_eq!(cache.peek(&"x"), Some(&10));
        // "y" is now the oldest
        assert_eq!(cache.put("z", 3), Some(("y", 2)));
    }

    #[test]
    fn test_remove_and_reuse_slots() {
        let mut cache = LruCache::new(3);
        cache.put(1, 'a');
        cache.put(2, 'b');
        cache.put(3, 'c');

        assert_eq!(cache.remove(&2), Some('b'));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lru(), Some(&1));

        cache.put(4, 'd');
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.pop_lru(), Some((1, 'a')));
        assert_eq!(cache.lru(), Some(&3));
    }

    #[test]
    fn test_empty_and_clear() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.lru(), None);
        assert_eq!(cache.pop_lru(), None);

        cache.put(1, 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&1).is_none());
    }
}
