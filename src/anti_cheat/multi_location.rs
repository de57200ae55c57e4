use crate::anti_cheat::registry::{CheatRegistry, IncidentKind, Severity};
use crate::core::config::AntiCheatConfig;
use crate::core::error::AnnounceError;
use crate::models::peer::Peer;
use crate::models::user::User;
use crate::stores::swarm::SwarmRegistry;
use std::net::IpAddr;

/// Flag a (user, torrent) pair announcing from too many distinct IPs.
///
/// Expects the caller to have recorded the current announce's IP observation
/// already, so the window count includes this request. The check only runs
/// when the reporting IP differs from the last known one for an existing
/// session. Policy is log-only by default: the incident is recorded and the
/// announce proceeds. `multi_location_hard_reject` turns it into a rejection
/// for sites that want enforcement.
#[allow(clippy::too_many_arguments)]
pub fn check_multi_location(
    prev: Option<&Peer>,
    user: &User,
    torrent_id: u32,
    ip: IpAddr,
    swarms: &SwarmRegistry,
    config: &AntiCheatConfig,
    registry: &CheatRegistry,
    now: i64,
) -> Result<(), AnnounceError> {
    if !config.multi_location_enabled {
        return Ok(());
    }

    match prev {
        Some(prev) if prev.ip != ip => {}
        _ => return Ok(()),
    }

    let window_secs = config.multi_location_window_minutes * 60;
    let distinct = swarms.distinct_ips_within(torrent_id, user.id, window_secs, now);
    if distinct < config.multi_location_threshold {
        return Ok(());
    }

    registry.log_incident(
        user,
        IncidentKind::MultiLocation,
        Severity::Medium,
        format!(
            "{distinct} distinct IPs within {} minutes",
            config.multi_location_window_minutes
        ),
        Some(torrent_id),
        Some(ip),
        now,
    );

    if config.multi_location_hard_reject {
        return Err(AnnounceError::MultiLocation);
    }

    Ok(())
}
