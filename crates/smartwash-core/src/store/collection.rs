// ── Generic reactive keyed collection ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent, reactive collection keyed by the vendor id.
///
/// Every mutation rebuilds the snapshot that subscribers receive, so
/// readers always see a consistent `Arc<Vec<_>>` without locking.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entry. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Replace an entry by applying `f` to a copy of it.
    ///
    /// Readers holding the old `Arc` keep the old value. Returns `false`
    /// if the key is unknown or `f` reported no change.
    pub(crate) fn update<F>(&self, key: &str, f: F) -> bool
    where
        T: Clone,
        F: FnOnce(&mut T) -> bool,
    {
        {
            let Some(mut entry) = self.by_key.get_mut(key) else {
                return false;
            };
            let mut copy = T::clone(entry.value());
            if !f(&mut copy) {
                return false;
            }
            *entry.value_mut() = Arc::new(copy);
        }
        // The shard guard must be released before the snapshot walks the map.
        self.rebuild_snapshot();
        true
    }

    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        self.by_key.clear();
        self.rebuild_snapshot();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.by_key.iter().map(|r| r.key().clone()).collect()
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<(String, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        let values = values.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
