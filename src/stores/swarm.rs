use crate::models::peer::Peer;
use dashmap::{DashMap, DashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Composite peer identity: (torrent_id, user_id).
pub type PairKey = (u32, u32);

#[derive(Debug)]
pub struct SwarmStats {
    pub seeders: AtomicU32,
    pub leechers: AtomicU32,
}

impl SwarmStats {
    fn new() -> Self {
        Self {
            seeders: AtomicU32::new(0),
            leechers: AtomicU32::new(0),
        }
    }
}

/// In-memory swarm membership, keyed by (torrent, user).
///
/// A user holds at most one live peer row per torrent. Announces for
/// different pairs proceed concurrently; announces for the same pair are
/// serialized through `lock_pair`, whose guard the orchestrator holds across
/// the whole mutation of one request.
pub struct SwarmRegistry {
    peers: DashMap<PairKey, Peer>,
    /// user ids per torrent, for peer-list selection
    members: DashMap<u32, DashSet<u32>>,
    stats: DashMap<u32, Arc<SwarmStats>>,
    /// (timestamp, ip) observations per pair, for multi-location detection
    ip_history: DashMap<PairKey, Vec<(i64, IpAddr)>>,
    locks: DashMap<PairKey, Arc<Mutex<()>>>,
}

impl SwarmRegistry {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            members: DashMap::new(),
            stats: DashMap::new(),
            ip_history: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Mutex serializing announces for one (torrent, user) pair.
    ///
    /// The caller locks it (via `lock_owned`) and holds the guard across
    /// snapshot, validation, and every mutation of the same request so
    /// racing client instances cannot interleave. The Arc keeps the mutex
    /// alive even if the entry is later evicted.
    pub fn pair_lock(&self, torrent_id: u32, user_id: u32) -> Arc<Mutex<()>> {
        self.locks
            .entry((torrent_id, user_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn find(&self, torrent_id: u32, user_id: u32) -> Option<Peer> {
        self.peers
            .get(&(torrent_id, user_id))
            .map(|entry| entry.value().clone())
    }

    /// Create or refresh the peer row for its (torrent, user) pair.
    pub fn upsert(&self, peer: Peer) {
        let key = (peer.torrent_id, peer.user_id);
        let stats = self
            .stats
            .entry(peer.torrent_id)
            .or_insert_with(|| Arc::new(SwarmStats::new()))
            .clone();

        self.members
            .entry(peer.torrent_id)
            .or_insert_with(DashSet::new)
            .insert(peer.user_id);

        match self.peers.insert(key, peer.clone()) {
            None => {
                if peer.is_seeder {
                    stats.seeders.fetch_add(1, Ordering::Relaxed);
                } else {
                    stats.leechers.fetch_add(1, Ordering::Relaxed);
                }
            }
            Some(old) if old.is_seeder != peer.is_seeder => {
                if peer.is_seeder {
                    stats.leechers.fetch_sub(1, Ordering::Relaxed);
                    stats.seeders.fetch_add(1, Ordering::Relaxed);
                } else {
                    stats.seeders.fetch_sub(1, Ordering::Relaxed);
                    stats.leechers.fetch_add(1, Ordering::Relaxed);
                }
            }
            Some(_) => {}
        }
    }

    /// Remove the peer row, used on `stopped`.
    pub fn remove(&self, torrent_id: u32, user_id: u32) -> Option<Peer> {
        let (_, peer) = self.peers.remove(&(torrent_id, user_id))?;

        if let Some(stats) = self.stats.get(&torrent_id) {
            if peer.is_seeder {
                stats.seeders.fetch_sub(1, Ordering::Relaxed);
            } else {
                stats.leechers.fetch_sub(1, Ordering::Relaxed);
            }
        }

        if let Some(members) = self.members.get(&torrent_id) {
            members.remove(&user_id);
        }

        self.ip_history.remove(&(torrent_id, user_id));

        Some(peer)
    }

    /// Up to `limit` other peers of the torrent, most recently announced
    /// first with a user-id tie-break so selection is deterministic.
    pub fn list_peers_excluding(
        &self,
        torrent_id: u32,
        exclude_user_id: u32,
        limit: usize,
    ) -> Vec<Peer> {
        let members = match self.members.get(&torrent_id) {
            Some(set) => set,
            None => return Vec::new(),
        };

        let mut peers: Vec<Peer> = members
            .iter()
            .filter(|user_id| **user_id != exclude_user_id)
            .filter_map(|user_id| self.find(torrent_id, *user_id))
            .collect();
        drop(members);

        peers.sort_unstable_by(|a, b| {
            b.last_announce
                .cmp(&a.last_announce)
                .then(b.user_id.cmp(&a.user_id))
        });
        peers.truncate(limit);
        peers
    }

    pub fn stats(&self, torrent_id: u32) -> (u32, u32) {
        match self.stats.get(&torrent_id) {
            Some(stats) => (
                stats.seeders.load(Ordering::Relaxed),
                stats.leechers.load(Ordering::Relaxed),
            ),
            None => (0, 0),
        }
    }

    /// Record an IP observation for multi-location detection.
    ///
    /// The history is pruned against `window_secs` on every write and a
    /// repeat announce from the last seen IP only refreshes its timestamp,
    /// so a stable long-running peer holds one entry, not one per announce.
    pub fn record_ip(&self, torrent_id: u32, user_id: u32, ip: IpAddr, now: i64, window_secs: i64) {
        let mut entry = self.ip_history.entry((torrent_id, user_id)).or_default();

        let cutoff = now - window_secs;
        entry.retain(|(seen, _)| *seen >= cutoff);

        match entry.last_mut() {
            Some((seen, last)) if *last == ip => *seen = now,
            _ => entry.push((now, ip)),
        }
    }

    /// Distinct IPs seen for the pair within the trailing window, pruning
    /// observations that fell out of it.
    pub fn distinct_ips_within(
        &self,
        torrent_id: u32,
        user_id: u32,
        window_secs: i64,
        now: i64,
    ) -> usize {
        let mut entry = match self.ip_history.get_mut(&(torrent_id, user_id)) {
            Some(entry) => entry,
            None => return 0,
        };

        let cutoff = now - window_secs;
        entry.retain(|(seen, _)| *seen >= cutoff);

        let mut ips: Vec<IpAddr> = entry.iter().map(|(_, ip)| *ip).collect();
        ips.sort_unstable();
        ips.dedup();
        ips.len()
    }

    /// Drop peers that have not announced within `timeout` seconds.
    pub fn evict_stale(&self, timeout: i64, now: i64) -> usize {
        let stale: Vec<PairKey> = self
            .peers
            .iter()
            .filter(|entry| now - entry.value().last_announce > timeout)
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0;
        for (torrent_id, user_id) in stale {
            if self.remove(torrent_id, user_id).is_some() {
                removed += 1;
            }
        }

        // Reclaim mutexes of pairs with no live peer. A strong count above
        // one means an announce still holds the Arc, so the entry stays.
        self.locks
            .retain(|key, lock| self.peers.contains_key(key) || Arc::strong_count(lock) > 1);

        removed
    }

    pub fn total_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn active_torrents(&self) -> usize {
        self.members
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .count()
    }

    /// Snapshot of every live peer, for the backend sync push.
    pub fn all_peers(&self) -> Vec<Peer> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl Default for SwarmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use uuid::Uuid;

    fn test_peer(
        torrent_id: u32,
        user_id: u32,
        ip: IpAddr,
        left: i64,
        last_announce: i64,
    ) -> Peer {
        Peer::new(
            torrent_id,
            user_id,
            [user_id as u8; 20],
            ip,
            6881,
            1024,
            512,
            left,
            last_announce,
            "TestClient/1.0".to_string(),
            Uuid::nil(),
        )
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_upsert_new_leecher() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 1000, 100));

        assert_eq!(registry.stats(1), (0, 1));
        assert!(registry.find(1, 1).is_some());
    }

    #[test]
    fn test_upsert_transition_to_seeder() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 1000, 100));
        registry.upsert(test_peer(1, 1, ip(1), 0, 200));

        assert_eq!(registry.stats(1), (1, 0));
        assert!(registry.find(1, 1).unwrap().is_seeder);
    }

    #[test]
    fn test_one_row_per_pair() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 1000, 100));
        registry.upsert(test_peer(1, 1, ip(2), 1000, 200));

        assert_eq!(registry.total_peers(), 1);
        assert_eq!(registry.find(1, 1).unwrap().ip, ip(2));
    }

    #[test]
    fn test_remove() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 0, 100));
        assert_eq!(registry.stats(1), (1, 0));

        let removed = registry.remove(1, 1).unwrap();
        assert!(removed.is_seeder);
        assert_eq!(registry.stats(1), (0, 0));
        assert!(registry.find(1, 1).is_none());
    }

    #[test]
    fn test_remove_absent_pair() {
        let registry = SwarmRegistry::new();
        assert!(registry.remove(1, 99).is_none());
    }

    #[test]
    fn test_list_peers_excluding_order_and_limit() {
        let registry = SwarmRegistry::new();
        for user_id in 1..=5u32 {
            registry.upsert(test_peer(1, user_id, ip(user_id as u8), 1000, user_id as i64 * 100));
        }

        let peers = registry.list_peers_excluding(1, 5, 3);
        assert_eq!(peers.len(), 3);
        // Most recent first; user 5 excluded
        let ids: Vec<u32> = peers.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![4, 3, 2]);
    }

    #[test]
    fn test_list_peers_other_torrent_not_returned() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 1000, 100));
        registry.upsert(test_peer(2, 2, ip(2), 1000, 100));

        let peers = registry.list_peers_excluding(1, 99, 50);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].user_id, 1);
    }

    #[test]
    fn test_distinct_ips_window() {
        let registry = SwarmRegistry::new();
        registry.record_ip(1, 1, ip(1), 1000, 3600);
        registry.record_ip(1, 1, ip(2), 1500, 3600);
        registry.record_ip(1, 1, ip(2), 1600, 3600);
        registry.record_ip(1, 1, ip(3), 2000, 3600);

        // Window of 1200s at t=2000 keeps everything
        assert_eq!(registry.distinct_ips_within(1, 1, 1200, 2000), 3);
        // Window of 600s prunes the t=1000 observation
        assert_eq!(registry.distinct_ips_within(1, 1, 600, 2000), 2);
        // Narrow window drops the older IPs
        assert_eq!(registry.distinct_ips_within(1, 1, 100, 2000), 1);
    }

    #[test]
    fn test_record_ip_same_ip_keeps_one_entry() {
        let registry = SwarmRegistry::new();
        // A stable peer announcing every 30 minutes for days
        for i in 0..1500i64 {
            registry.record_ip(1, 1, ip(1), 1000 + i * 1800, 3600);
        }

        let history = registry.ip_history.get(&(1, 1)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], (1000 + 1499 * 1800, ip(1)));
    }

    #[test]
    fn test_record_ip_prunes_on_write() {
        let registry = SwarmRegistry::new();
        // Alternating addresses so nothing collapses; only the window bounds
        // the history
        for i in 0..200i64 {
            registry.record_ip(1, 1, ip((i % 2) as u8 + 1), i * 600, 3600);
        }

        let history = registry.ip_history.get(&(1, 1)).unwrap();
        assert!(history.len() <= 7, "history held {} entries", history.len());
    }

    #[test]
    fn test_evict_stale() {
        let registry = SwarmRegistry::new();
        registry.upsert(test_peer(1, 1, ip(1), 0, 1000));
        registry.upsert(test_peer(1, 2, ip(2), 1000, 4000));

        let removed = registry.evict_stale(1800, 5000);
        assert_eq!(removed, 1);
        assert!(registry.find(1, 1).is_none());
        assert!(registry.find(1, 2).is_some());
        assert_eq!(registry.stats(1), (0, 1));
    }

    #[test]
    fn test_evict_stale_reclaims_locks_of_stopped_pairs() {
        let registry = SwarmRegistry::new();
        for user_id in 1..=50u32 {
            let guard = registry.pair_lock(1, user_id).blocking_lock_owned();
            registry.upsert(test_peer(1, user_id, ip(user_id as u8), 1000, 100));
            registry.remove(1, user_id);
            drop(guard);
        }

        assert_eq!(registry.total_peers(), 0);
        assert_eq!(registry.locks.len(), 50);

        registry.evict_stale(1800, 5000);
        assert!(registry.locks.is_empty());
    }

    #[test]
    fn test_evict_stale_keeps_live_and_held_locks() {
        let registry = SwarmRegistry::new();

        // Pair (1, 1) has a live peer, pair (1, 2) only a held guard
        registry.pair_lock(1, 1);
        registry.upsert(test_peer(1, 1, ip(1), 1000, 4000));
        let _guard = registry.pair_lock(1, 2).blocking_lock_owned();

        registry.evict_stale(1800, 5000);
        assert_eq!(registry.locks.len(), 2);
    }

    #[test]
    fn test_pair_lock_serializes() {
        use std::sync::atomic::AtomicUsize;

        let registry = Arc::new(SwarmRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    let _guard = registry.pair_lock(1, 1).blocking_lock_owned();
                    let seen = counter.load(Ordering::SeqCst);
                    counter.store(seen + 1, Ordering::SeqCst);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        // Non-atomic read-modify-write under the lock must not lose updates
        assert_eq!(counter.load(Ordering::SeqCst), 800);
    }
}
