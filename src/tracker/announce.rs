use crate::accounting::engine::{settle, Modifiers, TrafficReport};
use crate::anti_cheat::{frequency, multi_location, speed};
use crate::bencode::response::{build_failure, build_success};
use crate::core::config::TrackerSettings;
use crate::core::error::AnnounceError;
use crate::core::state::AppState;
use crate::locale::localize;
use crate::models::peer::Peer;
use crate::validation::params::{AnnounceEvent, AnnounceParams};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One announce request, from raw query to response body.
///
/// The context takes a single settings snapshot up front so every stage of
/// the pipeline sees one consistent configuration, and it owns the pair
/// lock for the mutation phase: the pre-mutation peer snapshot, the
/// anti-cheat checks against it, and every counter update commit or fail
/// together.
pub struct AnnounceContext<'a> {
    state: &'a AppState,
    settings: Arc<TrackerSettings>,
    user_agent: &'a str,
    ip: IpAddr,
    now: i64,
    /// Resolved once the credential maps to a user; failure reasons after
    /// that point are localized to the account's language.
    language: Option<String>,
}

impl<'a> AnnounceContext<'a> {
    pub fn new(state: &'a AppState, user_agent: &'a str, ip: IpAddr, now: i64) -> Self {
        Self {
            state,
            settings: state.settings(),
            user_agent,
            ip,
            now,
            language: None,
        }
    }

    /// Run the pipeline and produce the response body. Always a complete
    /// bencoded document: a peer list on success, a single localized
    /// `failure reason` otherwise, never both.
    pub async fn execute(mut self, raw_query: Option<&str>) -> Vec<u8> {
        self.state.metrics.increment_announces();

        match self.run(raw_query).await {
            Ok(body) => {
                self.state.metrics.increment_successful();
                body
            }
            Err(err) => {
                self.state.metrics.increment_failed();
                if matches!(
                    err,
                    AnnounceError::RateLimited { .. }
                        | AnnounceError::SpeedCapExceeded { .. }
                        | AnnounceError::MultiLocation
                ) {
                    self.state.metrics.increment_blocked();
                }
                warn!(kind = err.kind(), error = %err, ip = %self.ip, "Announce rejected");
                let reason = localize(err.message_key(), self.language.as_deref());
                build_failure(reason, err.interval_hints())
            }
        }
    }

    async fn run(&mut self, raw_query: Option<&str>) -> Result<Vec<u8>, AnnounceError> {
        let query = raw_query.ok_or(AnnounceError::BrowserAccess)?;
        let params = AnnounceParams::from_query(query);
        if params.looks_like_browser() {
            return Err(AnnounceError::BrowserAccess);
        }

        let request = params.normalize(&self.settings)?;

        let credential = self
            .state
            .credentials
            .resolve(&request.credential)
            .ok_or(AnnounceError::UnknownCredential)?;
        let user = self
            .state
            .users
            .get(credential.user_id)
            .ok_or(AnnounceError::UnknownCredential)?;
        self.language = Some(user.language.clone());

        if credential.is_revoked() {
            return Err(AnnounceError::CredentialRevoked);
        }
        if user.is_banned {
            return Err(AnnounceError::AccountBanned);
        }
        if self
            .state
            .client_bans
            .is_banned(&request.peer_id, self.user_agent)
        {
            return Err(AnnounceError::ClientBanned);
        }

        // The credential is bound to one torrent; a mismatching info_hash is
        // reported identically to an absent torrent so the response does not
        // reveal which lookup failed.
        let torrent = self
            .state
            .torrents
            .get(credential.torrent_id)
            .ok_or(AnnounceError::TorrentNotFound)?;
        if torrent.info_hash != request.info_hash {
            return Err(AnnounceError::TorrentNotFound);
        }

        let swarms = &self.state.swarms;
        let _guard = swarms.pair_lock(torrent.id, user.id).lock_owned().await;

        let prev = swarms.find(torrent.id, user.id);

        // Recorded before the checks so the window count includes this
        // request. With detection off, no history is kept at all.
        let anti_cheat = &self.state.config.anti_cheat;
        if anti_cheat.multi_location_enabled {
            swarms.record_ip(
                torrent.id,
                user.id,
                self.ip,
                self.now,
                anti_cheat.multi_location_window_minutes * 60,
            );
        }

        // Anti-cheat reads the pre-mutation snapshot. A stopping client is
        // never throttled on frequency; holding ghost peers in the swarm is
        // worse than one early announce.
        if request.event != Some(AnnounceEvent::Stopped) {
            frequency::check_frequency(prev.as_ref(), &self.settings, self.now)?;
        }
        speed::check_speed(
            prev.as_ref(),
            &user,
            request.uploaded,
            &self.state.config.anti_cheat,
            &self.state.cheats,
            self.now,
        )?;
        multi_location::check_multi_location(
            prev.as_ref(),
            &user,
            torrent.id,
            self.ip,
            swarms,
            &self.state.config.anti_cheat,
            &self.state.cheats,
            self.now,
        )?;

        let settlement = settle(
            prev.as_ref(),
            TrafficReport {
                uploaded: request.uploaded,
                downloaded: request.downloaded,
            },
            Modifiers {
                global_freeleech: self.settings.global_freeleech,
                torrent_freeleech: torrent.freeleech_active(self.now),
                double_upload_flagged: user.double_upload_active(),
                double_upload_until: user.double_upload_until,
            },
            self.now,
        );

        user.apply(&settlement.user_deltas);
        if settlement.expire_double_upload {
            debug!(user_id = user.id, "Double-upload bonus expired");
            user.clear_double_upload();
        }
        credential.record_use(
            self.now,
            settlement.user_deltas.uploaded,
            settlement.user_deltas.downloaded,
            self.ip,
            self.user_agent,
        );

        // A snatch is the first leecher-to-seeder transition of a session;
        // repeating `completed` or joining already-complete does not count.
        if request.event == Some(AnnounceEvent::Completed)
            && request.left == 0
            && prev.as_ref().is_some_and(|p| !p.is_seeder)
        {
            let total = torrent.record_snatch();
            self.state.metrics.increment_completions();
            info!(
                torrent_id = torrent.id,
                user_id = user.id,
                snatched = total,
                "Torrent completed"
            );
        }

        let peers = if request.event == Some(AnnounceEvent::Stopped) {
            swarms.remove(torrent.id, user.id);
            Vec::new()
        } else {
            swarms.upsert(Peer::new(
                torrent.id,
                user.id,
                request.peer_id,
                self.ip,
                request.port,
                request.uploaded,
                request.downloaded,
                request.left,
                self.now,
                self.user_agent.to_string(),
                request.credential,
            ));
            swarms.list_peers_excluding(torrent.id, user.id, request.numwant)
        };

        let (seeders, leechers) = swarms.stats(torrent.id);

        debug!(
            torrent_id = torrent.id,
            user_id = user.id,
            event = ?request.event,
            seeders,
            leechers,
            returned_peers = peers.len(),
            "Announce processed"
        );

        Ok(build_success(
            &peers,
            seeders,
            leechers,
            self.settings.announce_interval_secs,
            self.settings.min_announce_interval_secs,
            request.compact,
        ))
    }
}
