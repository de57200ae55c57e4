use crate::api::client::{PeerUpdate, TorrentUpdate, UpdateData, UserUpdate};
use crate::core::state::AppState;
use crate::utils::time::current_timestamp;

/// Snapshot the tracker state for the backend.
///
/// Reads are unsynchronized with in-flight announces; the backend treats
/// the snapshot as best-effort, the same way peers treat a peer list.
pub fn build_update(state: &AppState) -> UpdateData {
    let peers = state
        .swarms
        .all_peers()
        .into_iter()
        .map(|peer| PeerUpdate {
            torrent_id: peer.torrent_id,
            user_id: peer.user_id,
            peer_id: hex::encode(peer.peer_id),
            ip: peer.ip.to_string(),
            port: peer.port,
            uploaded: peer.uploaded,
            downloaded: peer.downloaded,
            left: peer.left,
            last_announce: peer.last_announce,
            user_agent: peer.user_agent,
        })
        .collect();

    let torrents = state
        .torrents
        .all()
        .into_iter()
        .map(|torrent| {
            let (seeders, leechers) = state.swarms.stats(torrent.id);
            TorrentUpdate {
                torrent_id: torrent.id,
                seeders,
                leechers,
                snatched: torrent.snatched(),
            }
        })
        .collect();

    let users = state
        .users
        .all()
        .into_iter()
        .map(|user| UserUpdate {
            user_id: user.id,
            uploaded: user.uploaded(),
            downloaded: user.downloaded(),
            nominal_uploaded: user.nominal_uploaded(),
            nominal_downloaded: user.nominal_downloaded(),
            seed_minutes: user.seed_minutes(),
            leech_minutes: user.leech_minutes(),
            cheat_warnings: user.cheat_warnings(),
        })
        .collect();

    UpdateData {
        peers,
        torrents,
        users,
        timestamp: current_timestamp(),
    }
}
