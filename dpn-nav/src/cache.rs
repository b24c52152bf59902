// SPDX-License-Identifier: AGPL-3.0-or-later
//! Identifier cache
//!
//! Maps (parent id, title) to the child id found by the last lookup. The
//! navigator invalidates entries on every mutation it performs; changes made
//! to the store by anyone else are not seen until [`IdCache::clear`].

use dpn_core::ItemId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

type Key = (ItemId, String);

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 { 0.0 } else { self.hit_count as f64 / total as f64 }
    }
}

#[derive(Default)]
pub struct IdCache {
    entries: RwLock<HashMap<Key, ItemId>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, parent: &ItemId, title: &str) -> Option<ItemId> {
        let found = self
            .entries
            .read()
            .get(&(parent.clone(), title.to_string()))
            .cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, parent: &ItemId, title: &str, id: &ItemId) {
        self.entries
            .write()
            .insert((parent.clone(), title.to_string()), id.clone());
    }

    pub fn invalidate(&self, parent: &ItemId, title: &str) {
        self.entries.write().remove(&(parent.clone(), title.to_string()));
    }

    /// Drop every entry resolving to `id` or keyed under it
    pub fn invalidate_id(&self, id: &ItemId) {
        self.entries
            .write()
            .retain(|(parent, _), child| parent != id && child != id);
    }

    /// Drop every entry for `title`, whatever its parent
    pub fn invalidate_title(&self, title: &str) {
        self.entries.write().retain(|(_, t), _| t != title);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len() as u64,
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn test_get_insert() {
        let cache = IdCache::new();
        assert!(cache.get(&id("root"), "docs").is_none());

        cache.insert(&id("root"), "docs", &id("d1"));
        assert_eq!(cache.get(&id("root"), "docs"), Some(id("d1")));
        assert!(cache.get(&id("other"), "docs").is_none());

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 2);
    }

    #[test]
    fn test_invalidate_id() {
        let cache = IdCache::new();
        cache.insert(&id("root"), "docs", &id("d1"));
        cache.insert(&id("d1"), "a.txt", &id("f1"));
        cache.insert(&id("root"), "other", &id("o1"));

        cache.invalidate_id(&id("d1"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id("root"), "other"), Some(id("o1")));
    }

    #[test]
    fn test_invalidate_key_and_title() {
        let cache = IdCache::new();
        cache.insert(&id("root"), "a", &id("1"));
        cache.insert(&id("x"), "a", &id("2"));
        cache.insert(&id("x"), "b", &id("3"));

        cache.invalidate(&id("x"), "b");
        assert_eq!(cache.len(), 2);

        cache.invalidate_title("a");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats { entries: 0, hit_count: 3, miss_count: 1 };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
