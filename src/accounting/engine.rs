use crate::models::peer::Peer;
use crate::models::user::UserDeltas;
use tracing::debug;

/// Elapsed windows beyond this are treated as unreliable and accrue no
/// seed/leech time (clock skew, first announce, long outage).
const MAX_RELIABLE_ELAPSED_SECS: i64 = 3600;

/// What the client reported on this announce.
#[derive(Debug, Clone, Copy)]
pub struct TrafficReport {
    /// Cumulative bytes uploaded since session start
    pub uploaded: u64,
    /// Cumulative bytes downloaded since session start
    pub downloaded: u64,
}

/// Economic modifiers in effect for this request.
#[derive(Debug, Clone, Copy)]
pub struct Modifiers {
    /// Site-wide freeleech flag from the settings snapshot
    pub global_freeleech: bool,
    /// Per-torrent freeleech, already checked against its deadline
    pub torrent_freeleech: bool,
    /// Whether the user's double-upload bonus flag is set
    pub double_upload_flagged: bool,
    /// When the double-upload bonus expires
    pub double_upload_until: i64,
}

/// The outcome of settling one announce.
///
/// Pure data: the orchestrator applies it inside the same transaction as
/// the swarm mutation. `expire_double_upload` makes the lazy flag expiry an
/// explicit signal instead of a hidden side effect of the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub elapsed_secs: i64,
    pub user_deltas: UserDeltas,
    pub expire_double_upload: bool,
}

/// Settle the traffic and time accounting for one announce against the
/// pre-mutation peer snapshot.
pub fn settle(prev: Option<&Peer>, report: TrafficReport, modifiers: Modifiers, now: i64) -> Settlement {
    let elapsed_secs = match prev {
        Some(peer) => now - peer.last_announce,
        None => 0,
    };

    // Reported totals are cumulative per session; deltas are measured
    // against the previous snapshot. A fresh session starts from zero.
    let (prev_uploaded, prev_downloaded) = match prev {
        Some(peer) => (peer.uploaded, peer.downloaded),
        None => (0, 0),
    };
    let uploaded_delta = report.uploaded.saturating_sub(prev_uploaded);
    let downloaded_delta = report.downloaded.saturating_sub(prev_downloaded);

    // Time accrues against the state the peer was in before this announce
    let (seed_minutes, leech_minutes) = match prev {
        Some(peer) if elapsed_secs > 0 && elapsed_secs <= MAX_RELIABLE_ELAPSED_SECS => {
            let minutes = (elapsed_secs / 60) as u64;
            if peer.is_seeder {
                (minutes, 0)
            } else {
                (0, minutes)
            }
        }
        _ => (0, 0),
    };

    let freeleech = modifiers.global_freeleech || modifiers.torrent_freeleech;
    let nominal_downloaded = if freeleech { 0 } else { downloaded_delta };

    let double_upload_live =
        modifiers.double_upload_flagged && now < modifiers.double_upload_until;
    let expire_double_upload =
        modifiers.double_upload_flagged && now >= modifiers.double_upload_until;
    let nominal_uploaded = if double_upload_live {
        uploaded_delta.saturating_mul(2)
    } else {
        uploaded_delta
    };

    debug!(
        elapsed_secs,
        uploaded_delta,
        downloaded_delta,
        nominal_uploaded,
        nominal_downloaded,
        freeleech,
        double_upload_live,
        "Settled announce accounting"
    );

    Settlement {
        elapsed_secs,
        user_deltas: UserDeltas {
            uploaded: uploaded_delta,
            downloaded: downloaded_delta,
            nominal_uploaded,
            nominal_downloaded,
            seed_minutes,
            leech_minutes,
        },
        expire_double_upload,
    }
}
