//! トレースキャッシュの追い出し

use crate::conclusion::ContextRef;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Decides which cached elements are dropped when a new one is added
pub trait Evictor<K> {
    /// Record `key` as most recently used and return the keys to evict.
    /// Keys for which `retain` holds are never evicted by this call.
    fn add_and_evict(&mut self, key: K, retain: &dyn Fn(&K) -> bool) -> Vec<K>;

    /// Record a use of an element that is already tracked
    fn touch(&mut self, key: &K);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Least-recently-used eviction with a fixed capacity
#[derive(Debug, Clone)]
pub struct LruEvictor<K> {
    capacity: usize,
    order: VecDeque<K>,
}

impl<K> LruEvictor<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K: Clone + Eq> Evictor<K> for LruEvictor<K> {
    fn add_and_evict(&mut self, key: K, retain: &dyn Fn(&K) -> bool) -> Vec<K> {
        if let Some(position) = self.order.iter().position(|k| *k == key) {
            self.order.remove(position);
        }
        self.order.push_back(key);

        let mut evicted = Vec::new();
        let mut position = 0;
        // the key just added sits at the back and is never a candidate
        while self.order.len() > self.capacity && position + 1 < self.order.len() {
            if retain(&self.order[position]) {
                position += 1;
                continue;
            }
            if let Some(old) = self.order.remove(position) {
                evicted.push(old);
            }
        }
        evicted
    }

    fn touch(&mut self, key: &K) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            if let Some(key) = self.order.remove(position) {
                self.order.push_back(key);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Bounded store of replayed contexts
pub struct TraceCache<V> {
    entries: HashMap<ContextRef, Arc<V>>,
    evictor: Box<dyn Evictor<ContextRef> + Send + Sync>,
    hits: usize,
    misses: usize,
}

impl<V> TraceCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self::with_evictor(Box::new(LruEvictor::new(capacity)))
    }

    pub fn with_evictor(evictor: Box<dyn Evictor<ContextRef> + Send + Sync>) -> Self {
        Self {
            entries: HashMap::new(),
            evictor,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: ContextRef) -> Option<Arc<V>> {
        match self.entries.get(&key) {
            Some(value) => {
                self.hits += 1;
                self.evictor.touch(&key);
                Some(Arc::clone(value))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `value`, evicting entries the evictor gives up on except those in `pinned`
    pub fn insert(&mut self, key: ContextRef, value: Arc<V>, pinned: &[ContextRef]) {
        self.entries.insert(key, value);
        let retain = |k: &ContextRef| pinned.contains(k);
        for old in self.evictor.add_and_evict(key, &retain) {
            self.entries.remove(&old);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K> Default for LruEvictor<K> {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ConceptId;

    fn never(_: &u32) -> bool {
        false
    }

    #[test]
    fn test_lru_evicts_oldest() {
        let mut evictor = LruEvictor::new(2);
        assert!(evictor.add_and_evict(1, &never).is_empty());
        assert!(evictor.add_and_evict(2, &never).is_empty());
        assert_eq!(evictor.add_and_evict(3, &never), vec![1]);
        assert_eq!(evictor.len(), 2);
    }

    #[test]
    fn test_lru_touch_refreshes_recency() {
        let mut evictor = LruEvictor::new(2);
        evictor.add_and_evict(1, &never);
        evictor.add_and_evict(2, &never);
        evictor.add_and_evict(1, &never);
        assert_eq!(evictor.add_and_evict(3, &never), vec![2]);
    }

    #[test]
    fn test_lru_respects_retain() {
        let mut evictor = LruEvictor::new(1);
        evictor.add_and_evict(1, &never);
        let keep_one = |k: &u32| *k == 1;
        assert!(evictor.add_and_evict(2, &keep_one).is_empty());
        assert_eq!(evictor.len(), 2);
        assert_eq!(evictor.add_and_evict(3, &keep_one), vec![2]);
    }

    #[test]
    fn test_lru_touch_without_add() {
        let mut evictor = LruEvictor::new(2);
        evictor.add_and_evict(1, &never);
        evictor.add_and_evict(2, &never);
        evictor.touch(&1);
        evictor.touch(&7);
        assert_eq!(evictor.len(), 2);
        assert_eq!(evictor.add_and_evict(3, &never), vec![2]);
    }

    #[test]
    fn test_trace_cache_hit_refreshes_recency() {
        let mut cache: TraceCache<&str> = TraceCache::new(2);
        let a = ContextRef::Concept(ConceptId(2));
        let b = ContextRef::Concept(ConceptId(3));
        let c = ContextRef::Concept(ConceptId(4));

        cache.insert(a, Arc::new("a"), &[]);
        cache.insert(b, Arc::new("b"), &[]);
        assert!(cache.get(a).is_some());
        cache.insert(c, Arc::new("c"), &[]);

        assert_eq!(cache.get(a).as_deref(), Some(&"a"));
        assert!(cache.get(b).is_none());
        assert!(cache.get(c).is_some());
    }

    #[test]
    fn test_trace_cache_drops_evicted_entries() {
        let mut cache: TraceCache<&str> = TraceCache::new(1);
        let a = ContextRef::Concept(ConceptId(2));
        let b = ContextRef::Concept(ConceptId(3));

        cache.insert(a, Arc::new("a"), &[]);
        assert!(cache.get(a).is_some());
        cache.insert(b, Arc::new("b"), &[]);
        assert!(cache.get(a).is_none());
        assert_eq!(cache.get(b).as_deref(), Some(&"b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (2, 1));
    }
}
