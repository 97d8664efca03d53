//! Recency-ordered storage engine
//!
//! Hash map for O(1) key lookup paired with an arena-backed doubly-linked
//! list for O(1) touch and eviction. The list runs from head (least
//! recently used) to tail (most recently used); freed arena slots are
//! recycled through a free list.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

/// Node in the recency list
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Outcome of a combined lookup-or-insert
pub(crate) enum Admission<K, V> {
    /// Key was already resident
    Hit,
    /// Key was inserted; carries the entry evicted to make room, if any
    Inserted { evicted: Option<(K, V)> },
}

/// Recency engine with fixed capacity
///
/// Invariant: `map` and the list always hold exactly the same key set,
/// and every `map` entry points at a live arena slot.
pub(crate) struct LruStore<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruStore<K, V> {
    /// Create an engine with the given capacity. Callers validate that
    /// `capacity` is nonzero before construction.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity validated by the cache layer");

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Number of resident entries
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Check whether no entries are resident
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Arena slot of the least recently used entry
    pub(crate) fn first(&self) -> Option<usize> {
        self.head
    }

    /// Key, value, and successor slot of a live entry
    pub(crate) fn entry_at(&self, idx: usize) -> Option<(&K, &V, Option<usize>)> {
        self.nodes
            .get(idx)
            .and_then(|slot| slot.as_ref())
            .map(|node| (&node.key, &node.value, node.next))
    }
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Check residency without disturbing recency order
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Look up a key and mark it most recently used
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_tail(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Look up a key without disturbing recency order
    pub(crate) fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Insert or replace a value, marking the key most recently used
    ///
    /// Returns the entry evicted to make room, if any. Replacing a
    /// resident key never evicts.
    pub(crate) fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.nodes[idx].as_mut() {
                node.value = value;
            }
            self.move_to_tail(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.pop_head()
        } else {
            None
        };
        self.push_tail(key, value);
        evicted
    }

    /// Combined lookup-or-insert
    ///
    /// The producer runs only when the key is absent; a producer error
    /// propagates unchanged and leaves the store untouched.
    pub(crate) fn try_get_or_insert_with<F, E>(
        &mut self,
        key: K,
        producer: F,
    ) -> Result<(&V, Admission<K, V>), E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(&idx) = self.map.get(&key) {
            self.move_to_tail(idx);
            return match self.nodes[idx].as_ref() {
                Some(node) => Ok((&node.value, Admission::Hit)),
                None => unreachable!("resident key points at a freed slot"),
            };
        }

        let value = producer()?;
        let evicted = if self.map.len() >= self.capacity {
            self.pop_head()
        } else {
            None
        };
        let node = self.push_tail(key, value);
        Ok((&node.value, Admission::Inserted { evicted }))
    }

    /// Remove a key, returning its value
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        let node = self.nodes[idx].take()?;
        self.detach(node.prev, node.next);
        self.free_list.push(idx);
        Some(node.value)
    }

    /// Drop the least recently used entry
    pub(crate) fn pop_head(&mut self) -> Option<(K, V)> {
        let idx = self.head?;
        let node = self.nodes[idx].take()?;
        self.map.remove(&node.key);
        self.detach(node.prev, node.next);
        self.free_list.push(idx);
        Some((node.key, node.value))
    }

    fn move_to_tail(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return; // Already most recent
        }

        let (prev, next) = match self.nodes[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        self.detach(prev, next);

        let old_tail = self.tail;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }
        if let Some(tail_idx) = old_tail {
            if let Some(tail) = self.nodes[tail_idx].as_mut() {
                tail.next = Some(idx);
            }
        }
        self.tail = Some(idx);
    }

    /// Rewire the neighbors of a node leaving its position
    fn detach(&mut self, prev: Option<usize>, next: Option<usize>) {
        match prev {
            Some(prev_idx) => {
                if let Some(node) = self.nodes[prev_idx].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(node) = self.nodes[next_idx].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Link a fresh entry at the most-recently-used end
    fn push_tail(&mut self, key: K, value: V) -> &Node<K, V> {
        let idx = self.alloc_slot();
        let prev = self.tail;

        if let Some(tail_idx) = prev {
            if let Some(tail) = self.nodes[tail_idx].as_mut() {
                tail.next = Some(idx);
            }
        }
        self.tail = Some(idx);
        if self.head.is_none() {
            self.head = Some(idx);
        }

        self.map.insert(key.clone(), idx);
        self.nodes[idx].insert(Node {
            key,
            value,
            prev,
            next: None,
        })
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order<K: Clone, V>(store: &LruStore<K, V>) -> Vec<K> {
        let mut keys = Vec::new();
        let mut next = store.first();
        while let Some(idx) = next {
            if let Some((key, _, succ)) = store.entry_at(idx) {
                keys.push(key.clone());
                next = succ;
            } else {
                break;
            }
        }
        keys
    }

    #[test]
    fn test_put_and_get() {
        let mut store = LruStore::new(2);

        store.put(1, "a");
        store.put(2, "b");

        assert_eq!(store.get(&1), Some(&"a"));
        assert_eq!(store.get(&2), Some(&"b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_eviction_order() {
        let mut store = LruStore::new(2);

        store.put(1, "a");
        store.put(2, "b");
        let evicted = store.put(3, "c");

        assert_eq!(evicted, Some((1, "a")));
        assert_eq!(store.get(&1), None);
        assert_eq!(store.get(&2), Some(&"b"));
        assert_eq!(store.get(&3), Some(&"c"));
    }

    #[test]
    fn test_get_touches() {
        let mut store = LruStore::new(2);

        store.put(1, "a");
        store.put(2, "b");
        store.get(&1); // 2 is now least recent
        let evicted = store.put(3, "c");

        assert_eq!(evicted, Some((2, "b")));
        assert_eq!(store.get(&1), Some(&"a"));
        assert_eq!(store.get(&2), None);
    }

    #[test]
    fn test_peek_does_not_touch() {
        let mut store = LruStore::new(3);

        store.put(1, "a");
        store.put(2, "b");
        store.put(3, "c");

        assert_eq!(store.peek(&1), Some(&"a"));
        assert_eq!(store.peek(&1), Some(&"a"));
        assert_eq!(order(&store), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_keeps_size() {
        let mut store = LruStore::new(2);

        store.put(1, "a");
        store.put(2, "b");
        let evicted = store.put(1, "a2");

        assert_eq!(evicted, None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.peek(&1), Some(&"a2"));
        assert_eq!(order(&store), vec![2, 1]);
    }

    #[test]
    fn test_remove() {
        let mut store = LruStore::new(3);

        store.put(1, "a");
        store.put(2, "b");
        store.put(3, "c");

        assert_eq!(store.remove(&2), Some("b"));
        assert_eq!(store.remove(&2), None);
        assert_eq!(store.len(), 2);
        assert_eq!(order(&store), vec![1, 3]);
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut store = LruStore::new(3);

        store.put(1, "a");
        store.put(2, "b");
        store.put(3, "c");

        assert_eq!(store.remove(&1), Some("a"));
        assert_eq!(store.remove(&3), Some("c"));
        assert_eq!(order(&store), vec![2]);

        store.put(4, "d");
        assert_eq!(order(&store), vec![2, 4]);
    }

    #[test]
    fn test_pop_head() {
        let mut store = LruStore::new(3);

        store.put(1, "a");
        store.put(2, "b");

        assert_eq!(store.pop_head(), Some((1, "a")));
        assert_eq!(store.pop_head(), Some((2, "b")));
        assert_eq!(store.pop_head(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut store = LruStore::new(3);

        store.put(1, "a");
        store.put(2, "b");
        store.clear();

        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.first(), None);

        store.put(3, "c");
        assert_eq!(order(&store), vec![3]);
    }

    #[test]
    fn test_slot_reuse() {
        let mut store = LruStore::new(2);

        // Churn well past capacity; the arena must not grow beyond it.
        for i in 0..100 {
            store.put(i, i);
        }

        assert_eq!(store.len(), 2);
        assert!(store.nodes.len() <= 2);
        assert_eq!(order(&store), vec![98, 99]);
    }

    #[test]
    fn test_try_get_or_insert_hit() {
        let mut store = LruStore::new(2);
        store.put(1, 10);

        let result: Result<_, ()> = store.try_get_or_insert_with(1, || panic!("resident key"));
        let (value, admission) = result.unwrap();

        assert_eq!(*value, 10);
        assert!(matches!(admission, Admission::Hit));
        assert_eq!(order(&store), vec![1]);
    }

    #[test]
    fn test_try_get_or_insert_miss() {
        let mut store = LruStore::new(1);
        store.put(1, 10);

        let result: Result<_, ()> = store.try_get_or_insert_with(2, || Ok(20));
        let (value, admission) = result.unwrap();

        assert_eq!(*value, 20);
        match admission {
            Admission::Inserted { evicted } => assert_eq!(evicted, Some((1, 10))),
            Admission::Hit => panic!("expected insert"),
        }
    }

    #[test]
    fn test_try_get_or_insert_error_leaves_store() {
        let mut store = LruStore::new(2);
        store.put(1, 10);

        let result = store.try_get_or_insert_with(2, || Err("producer failed"));

        assert_eq!(result.err(), Some("producer failed"));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&2));
        assert_eq!(store.peek(&1), Some(&10));
        assert_eq!(order(&store), vec![1]);
    }
}
