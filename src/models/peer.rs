use std::net::IpAddr;
use uuid::Uuid;

/// An active swarm member.
///
/// At most one live peer exists per (torrent, user) pair; it is created on
/// the first announce of a session and deleted on `stopped`. Re-announcing
/// after a stop creates a fresh row with no memory of prior counters.
#[derive(Clone, Debug)]
pub struct Peer {
    /// Torrent ID from the torrent store
    pub torrent_id: u32,
    /// User ID from the user store
    pub user_id: u32,
    /// 20-byte client-reported peer identifier
    pub peer_id: [u8; 20],
    /// IP address (IPv4 or IPv6)
    pub ip: IpAddr,
    /// Port number
    pub port: u16,
    /// Client-reported cumulative bytes uploaded this session
    pub uploaded: u64,
    /// Client-reported cumulative bytes downloaded this session
    pub downloaded: u64,
    /// Bytes left to download; negative means the client reported an
    /// unknown amount (treated as not complete)
    pub left: i64,
    /// Unix timestamp of the last announce
    pub last_announce: i64,
    /// User-Agent string from the HTTP header
    pub user_agent: String,
    /// Credential used to authenticate this peer
    pub credential: Uuid,
    /// Whether this peer holds the complete content (left == 0)
    pub is_seeder: bool,
}

impl Peer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        torrent_id: u32,
        user_id: u32,
        peer_id: [u8; 20],
        ip: IpAddr,
        port: u16,
        uploaded: u64,
        downloaded: u64,
        left: i64,
        last_announce: i64,
        user_agent: String,
        credential: Uuid,
    ) -> Self {
        Self {
            torrent_id,
            user_id,
            peer_id,
            ip,
            port,
            uploaded,
            downloaded,
            left,
            last_announce,
            user_agent,
            credential,
            is_seeder: left == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn peer_with_left(left: i64) -> Peer {
        Peer::new(
            1,
            1,
            [0u8; 20],
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            6881,
            0,
            0,
            left,
            1000,
            "TestClient/1.0".to_string(),
            Uuid::nil(),
        )
    }

    #[test]
    fn test_seeder_iff_left_zero() {
        assert!(peer_with_left(0).is_seeder);
        assert!(!peer_with_left(1000).is_seeder);
    }

    #[test]
    fn test_negative_left_is_not_seeder() {
        // Buggy clients report negative `left`; that means unknown, not done
        assert!(!peer_with_left(-1).is_seeder);
    }
}
