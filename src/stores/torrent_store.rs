use crate::models::torrent::Torrent;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory torrent records, indexed by id.
pub struct TorrentStore {
    by_id: DashMap<u32, Arc<Torrent>>,
}

impl TorrentStore {
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
        }
    }


    /// Insert or replace a torrent record.
    pub fn insert(&self, torrent: Torrent) {
        self.by_id.insert(torrent.id, Arc::new(torrent));
    }

    pub fn remove(&self, id: u32) -> Option<Arc<Torrent>> {
        self.by_id.remove(&id).map(|(_, torrent)| torrent)
    }

    pub fn get(&self, id: u32) -> Option<Arc<Torrent>> {
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn all(&self) -> Vec<Arc<Torrent>> {
        self.by_id.iter().map(|e| Arc::clone(e.value())).collect()
    }

    pub fn clear(&self) {
        self.by_id.clear();
    }
}

impl Default for TorrentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let store = TorrentStore::new();
        store.insert(Torrent::new(7, [0xab; 20], 1 << 20, false, None));

        assert_eq!(store.get(7).unwrap().id, 7);
        assert!(store.get(8).is_none());
    }

    #[test]
    fn test_remove() {
        let store = TorrentStore::new();
        store.insert(Torrent::new(7, [0xab; 20], 0, false, None));
        store.remove(7);

        assert!(store.get(7).is_none());
    }
}
