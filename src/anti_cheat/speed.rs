use crate::anti_cheat::registry::{CheatRegistry, IncidentKind, Severity};
use crate::core::config::AntiCheatConfig;
use crate::core::error::AnnounceError;
use crate::models::peer::Peer;
use crate::models::user::User;

/// Overage factor at which an incident is treated as critical rather than
/// merely high: five times the configured ceiling is not a misconfigured
/// client, it is a fabricated report.
const CRITICAL_OVERAGE_FACTOR: f64 = 5.0;

/// Reject announces whose reported upload delta implies an impossible speed.
///
/// The check samples against the pre-mutation peer snapshot and only fires
/// once the elapsed window is long enough to be meaningful; short windows
/// produce wildly inflated instantaneous rates for honest clients.
pub fn check_speed(
    prev: Option<&Peer>,
    user: &User,
    reported_uploaded: u64,
    config: &AntiCheatConfig,
    registry: &CheatRegistry,
    now: i64,
) -> Result<(), AnnounceError> {
    let prev = match prev {
        Some(prev) => prev,
        None => return Ok(()),
    };

    let elapsed = now - prev.last_announce;
    if elapsed < config.min_speed_check_interval_secs {
        return Ok(());
    }

    let upload_delta = reported_uploaded.saturating_sub(prev.uploaded);
    if upload_delta == 0 {
        return Ok(());
    }

    let speed_kibps = (upload_delta as f64 / 1024.0) / elapsed as f64;
    if speed_kibps <= config.max_upload_speed_kibps {
        return Ok(());
    }

    let severity = if speed_kibps >= config.max_upload_speed_kibps * CRITICAL_OVERAGE_FACTOR {
        Severity::Critical
    } else {
        Severity::High
    };

    registry.log_incident(
        user,
        IncidentKind::SpeedCap,
        severity,
        format!(
            "reported {speed_kibps:.0} KiB/s over {elapsed}s against a {:.0} KiB/s cap",
            config.max_upload_speed_kibps
        ),
        Some(prev.torrent_id),
        Some(prev.ip),
        now,
    );

    Err(AnnounceError::SpeedCapExceeded {
        speed_kibps,
        cap_kibps: config.max_upload_speed_kibps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use uuid::Uuid;

    fn config() -> AntiCheatConfig {
        AntiCheatConfig {
            max_upload_speed_kibps: 1024.0,
            min_speed_check_interval_secs: 10,
            multi_location_enabled: false,
            multi_location_window_minutes: 60,
            multi_location_threshold: 3,
            multi_location_hard_reject: false,
        }
    }

    fn prev_peer(uploaded: u64, last_announce: i64) -> Peer {
        Peer {
            torrent_id: 7,
            user_id: 3,
            peer_id: [0u8; 20],
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            port: 6881,
            uploaded,
            downloaded: 0,
            left: 500,
            last_announce,
            user_agent: "qBittorrent/4.5".to_string(),
            credential: Uuid::nil(),
            is_seeder: false,
        }
    }

    #[test]
    fn test_gigabyte_in_ten_seconds_rejected() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        let prev = prev_peer(0, 1000);

        // 1 GiB over 10 seconds against a 1024 KiB/s cap
        let err = check_speed(
            Some(&prev),
            &user,
            1 << 30,
            &config(),
            &registry,
            1010,
        )
        .unwrap_err();

        match err {
            AnnounceError::SpeedCapExceeded {
                speed_kibps,
                cap_kibps,
            } => {
                assert!((speed_kibps - 104_857.6).abs() < 0.1);
                assert_eq!(cap_kibps, 1024.0);
            }
            other => panic!("expected SpeedCapExceeded, got {other:?}"),
        }

        let incidents = registry.recent(1);
        assert_eq!(incidents[0].severity, Severity::Critical);
        assert_eq!(incidents[0].torrent_id, Some(7));
        assert_eq!(user.cheat_warnings(), 1);
    }

    #[test]
    fn test_moderate_overage_is_high_not_critical() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        let prev = prev_peer(0, 1000);

        // ~2048 KiB/s: over the cap but under the 5x escalation point
        let result = check_speed(
            Some(&prev),
            &user,
            2048 * 1024 * 10,
            &config(),
            &registry,
            1010,
        );
        assert!(result.is_err());
        assert_eq!(registry.recent(1)[0].severity, Severity::High);
    }

    #[test]
    fn test_within_cap_passes() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        let prev = prev_peer(0, 1000);

        // 512 KiB/s
        let result = check_speed(
            Some(&prev),
            &user,
            512 * 1024 * 10,
            &config(),
            &registry,
            1010,
        );
        assert!(result.is_ok());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_short_window_skipped() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        let prev = prev_peer(0, 1000);

        // Huge delta, but only 5s elapsed: below the sampling window
        let result = check_speed(Some(&prev), &user, 1 << 30, &config(), &registry, 1005);
        assert!(result.is_ok());
    }

    #[test]
    fn test_first_announce_skipped() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        let result = check_speed(None, &user, 1 << 30, &config(), &registry, 1010);
        assert!(result.is_ok());
    }

    #[test]
    fn test_counter_reset_not_flagged() {
        let registry = CheatRegistry::new();
        let user = User::new(3, false, "en".to_string());
        // Client restarted and reports less than before: delta saturates to 0
        let prev = prev_peer(5_000_000, 1000);
        let result = check_speed(Some(&prev), &user, 100, &config(), &registry, 1020);
        assert!(result.is_ok());
    }
}
