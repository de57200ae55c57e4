use crate::anti_cheat::registry::CheatRegistry;
use crate::stores::swarm::SwarmRegistry;
use crate::stores::torrent_store::TorrentStore;
use crate::stores::user_store::UserStore;
use crate::utils::time::current_timestamp;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub total_announces: AtomicU64,
    pub successful_announces: AtomicU64,
    pub failed_announces: AtomicU64,
    pub blocked_announces: AtomicU64,
    pub completions: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_announces: u64,
    pub successful_announces: u64,
    pub failed_announces: u64,
    pub blocked_announces: u64,
    pub success_rate: f64,
    pub completions: u64,
    pub active_peers: usize,
    pub active_torrents: usize,
    pub cached_torrents: usize,
    pub cached_users: usize,
    pub cheat_incidents: usize,
    pub uptime_seconds: i64,
    pub requests_per_second: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_announces: AtomicU64::new(0),
            successful_announces: AtomicU64::new(0),
            failed_announces: AtomicU64::new(0),
            blocked_announces: AtomicU64::new(0),
            completions: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_announces(&self) {
        self.total_announces.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_successful(&self) {
        self.successful_announces.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed_announces.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_blocked(&self) {
        self.blocked_announces.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_completions(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Collect counters and derive success_rate, requests_per_second, and
    /// uptime_seconds.
    pub fn get_snapshot(
        &self,
        swarms: &SwarmRegistry,
        users: &UserStore,
        torrents: &TorrentStore,
        cheats: &CheatRegistry,
    ) -> MetricsSnapshot {
        let now = current_timestamp();

        let total_announces = self.total_announces.load(Ordering::Relaxed);
        let successful_announces = self.successful_announces.load(Ordering::Relaxed);
        let failed_announces = self.failed_announces.load(Ordering::Relaxed);
        let blocked_announces = self.blocked_announces.load(Ordering::Relaxed);
        let completions = self.completions.load(Ordering::Relaxed);

        let success_rate = if total_announces > 0 {
            (successful_announces as f64 / total_announces as f64) * 100.0
        } else {
            0.0
        };

        let uptime_seconds = now - self.start_time;

        let requests_per_second = if uptime_seconds > 0 {
            total_announces as f64 / uptime_seconds as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            total_announces,
            successful_announces,
            failed_announces,
            blocked_announces,
            success_rate,
            completions,
            active_peers: swarms.total_peers(),
            active_torrents: swarms.active_torrents(),
            cached_torrents: torrents.len(),
            cached_users: users.len(),
            cheat_incidents: cheats.len(),
            uptime_seconds,
            requests_per_second,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
