// Application state (AppState)

use crate::anti_cheat::registry::CheatRegistry;
use crate::api::client::ApiClient;
use crate::core::config::{Config, TrackerSettings};
use crate::metrics::collector::Metrics;
use crate::security::client_bans::ClientBanList;
use crate::stores::credential_store::CredentialStore;
use crate::stores::swarm::SwarmRegistry;
use crate::stores::torrent_store::TorrentStore;
use crate::stores::user_store::UserStore;
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared application state.
///
/// All fields are wrapped in Arc for cheap cloning into request handlers.
/// Tracker settings sit behind an extra RwLock so an admin reload swaps the
/// whole snapshot at once; each announce clones the Arc a single time and
/// sees one consistent configuration for its full pipeline.
#[derive(Clone)]
pub struct AppState {
    /// Active peers, swarm stats, and per-pair locks
    pub swarms: Arc<SwarmRegistry>,

    /// User records synced from the backend
    pub users: Arc<UserStore>,

    /// Torrent records synced from the backend
    pub torrents: Arc<TorrentStore>,

    /// Announce credentials and their usage records
    pub credentials: Arc<CredentialStore>,

    /// Banned client peer-id prefixes and user agents
    pub client_bans: Arc<ClientBanList>,

    /// Anti-cheat incident log
    pub cheats: Arc<CheatRegistry>,

    /// Metrics collector
    pub metrics: Arc<Metrics>,

    /// Backend sync client
    pub api: Arc<ApiClient>,

    /// Hot-reloadable tracker settings snapshot
    settings: Arc<RwLock<Arc<TrackerSettings>>>,

    /// Static configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client_bans = Arc::new(ClientBanList::from_config(
            &config.security.banned_peer_prefixes,
            &config.security.banned_user_agents,
        ));
        let api = Arc::new(ApiClient::new(
            config.sync.data_endpoint.clone(),
            config.sync.api_key.clone(),
        )?);
        let settings = Arc::new(RwLock::new(Arc::new(config.tracker.clone())));
        let config = Arc::new(config);

        Ok(Self {
            swarms: Arc::new(SwarmRegistry::new()),
            users: Arc::new(UserStore::new()),
            torrents: Arc::new(TorrentStore::new()),
            credentials: Arc::new(CredentialStore::new()),
            client_bans,
            cheats: Arc::new(CheatRegistry::new()),
            metrics: Arc::new(Metrics::new()),
            api,
            settings,
            config,
        })
    }

    /// The settings snapshot for one request.
    pub fn settings(&self) -> Arc<TrackerSettings> {
        Arc::clone(
            &self
                .settings
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Replace the settings snapshot. In-flight requests keep the one they
    /// already took.
    pub fn replace_settings(&self, settings: TrackerSettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }
}
