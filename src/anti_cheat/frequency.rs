use crate::core::config::TrackerSettings;
use crate::core::error::AnnounceError;
use crate::models::peer::Peer;

/// Reject announces that arrive faster than the enforced minimum interval.
///
/// Only applies when a previous peer row exists; a fresh session is never
/// throttled. The rejection carries the configured `interval`/`min interval`
/// so compliant clients correct their cadence from the failure body alone.
pub fn check_frequency(
    prev: Option<&Peer>,
    settings: &TrackerSettings,
    now: i64,
) -> Result<(), AnnounceError> {
    let prev = match prev {
        Some(prev) => prev,
        None => return Ok(()),
    };

    let elapsed = now - prev.last_announce;
    if elapsed < settings.enforced_min_announce_interval_secs {
        return Err(AnnounceError::RateLimited {
            elapsed,
            enforced_min: settings.enforced_min_announce_interval_secs,
            interval: settings.announce_interval_secs,
            min_interval: settings.min_announce_interval_secs,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use uuid::Uuid;

    fn settings() -> TrackerSettings {
        TrackerSettings {
            announce_interval_secs: 1800,
            min_announce_interval_secs: 900,
            enforced_min_announce_interval_secs: 60,
            global_freeleech: false,
            default_numwant: 50,
            max_numwant: 200,
        }
    }

    fn peer(last_announce: i64) -> Peer {
        Peer {
            torrent_id: 1,
            user_id: 2,
            peer_id: [0u8; 20],
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 6881,
            uploaded: 0,
            downloaded: 0,
            left: 100,
            last_announce,
            user_agent: "qBittorrent/4.5".to_string(),
            credential: Uuid::nil(),
            is_seeder: false,
        }
    }

    #[test]
    fn test_first_announce_never_throttled() {
        assert!(check_frequency(None, &settings(), 1000).is_ok());
    }

    #[test]
    fn test_too_soon_rejected_with_hints() {
        let prev = peer(1000);
        let err = check_frequency(Some(&prev), &settings(), 1010).unwrap_err();
        match err {
            AnnounceError::RateLimited {
                elapsed,
                enforced_min,
                interval,
                min_interval,
            } => {
                assert_eq!(elapsed, 10);
                assert_eq!(enforced_min, 60);
                assert_eq!(interval, 1800);
                assert_eq!(min_interval, 900);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_exactly_enforced_minimum_allowed() {
        let prev = peer(1000);
        assert!(check_frequency(Some(&prev), &settings(), 1060).is_ok());
    }

    #[test]
    fn test_past_minimum_allowed() {
        let prev = peer(1000);
        assert!(check_frequency(Some(&prev), &settings(), 2800).is_ok());
    }
}
