use std::sync::atomic::{AtomicU32, Ordering};

/// A tracked torrent.
///
/// Owned by the content-management backend; the announce path only reads it
/// and increments `snatched` on completion transitions.
#[derive(Debug)]
pub struct Torrent {
    /// Torrent ID
    pub id: u32,
    /// 20-byte SHA-1 info hash
    pub info_hash: [u8; 20],
    /// Content size in bytes
    pub size: u64,
    /// Whether downloads of this torrent are free (do not count against ratio)
    pub is_freeleech: bool,
    /// Unix timestamp at which the per-torrent freeleech ends, if bounded
    pub freeleech_until: Option<i64>,
    /// Completion counter, incremented once per leecher-to-seeder transition
    snatched: AtomicU32,
}

impl Torrent {
    pub fn new(
        id: u32,
        info_hash: [u8; 20],
        size: u64,
        is_freeleech: bool,
        freeleech_until: Option<i64>,
    ) -> Self {
        Self {
            id,
            info_hash,
            size,
            is_freeleech,
            freeleech_until,
            snatched: AtomicU32::new(0),
        }
    }

    /// Whether the per-torrent freeleech flag applies at `now`.
    pub fn freeleech_active(&self, now: i64) -> bool {
        self.is_freeleech
            && match self.freeleech_until {
                Some(deadline) => now < deadline,
                None => true,
            }
    }

    pub fn record_snatch(&self) -> u32 {
        self.snatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snatched(&self) -> u32 {
        self.snatched.load(Ordering::Relaxed)
    }

    pub fn set_snatched(&self, count: u32) {
        self.snatched.store(count, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeleech_unbounded() {
        let t = Torrent::new(1, [0u8; 20], 1 << 30, true, None);
        assert!(t.freeleech_active(i64::MAX - 1));
    }

    #[test]
    fn test_freeleech_deadline() {
        let t = Torrent::new(1, [0u8; 20], 1 << 30, true, Some(2000));
        assert!(t.freeleech_active(1999));
        assert!(!t.freeleech_active(2000));
    }

    #[test]
    fn test_freeleech_flag_off() {
        let t = Torrent::new(1, [0u8; 20], 1 << 30, false, Some(i64::MAX));
        assert!(!t.freeleech_active(0));
    }

    #[test]
    fn test_snatch_counter() {
        let t = Torrent::new(1, [0u8; 20], 0, false, None);
        assert_eq!(t.snatched(), 0);
        assert_eq!(t.record_snatch(), 1);
        assert_eq!(t.record_snatch(), 2);
        assert_eq!(t.snatched(), 2);
    }
}
