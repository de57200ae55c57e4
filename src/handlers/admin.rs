use crate::core::error::AdminError;
use crate::core::startup::populate_from_api;
use crate::core::state::AppState;
use crate::models::admin::{
    ApiKeyQuery, ClientBanListResponse, ClientBanQuery, CredentialAddQuery,
    CredentialRevokeQuery, IncidentsQuery, SettingsUpdateQuery, SuccessResponse,
    TorrentAddQuery, TorrentRemoveQuery, UserAddQuery, UserRemoveQuery,
};
use crate::models::credential::Credential;
use crate::models::torrent::Torrent;
use crate::models::user::User;
use crate::utils::auth::verify_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

fn authorize(provided: &str, state: &AppState) -> Result<(), AdminError> {
    if !verify_api_key(provided, &state.config.sync.api_key) {
        warn!("Unauthorized admin request");
        return Err(AdminError::InvalidApiKey);
    }
    Ok(())
}

fn ok(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// GET /torrent/add?api_key=<key>&id=<id>&info_hash=<hex>&size=<bytes>&freeleech=<0|1>
pub async fn torrent_add_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentAddQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    let hash_bytes = hex::decode(&params.info_hash)
        .map_err(|e| AdminError::InvalidParameter(format!("info_hash: {e}")))?;
    if hash_bytes.len() != 20 {
        return Err(AdminError::InvalidParameter(format!(
            "info_hash must be 20 bytes, got {}",
            hash_bytes.len()
        )));
    }
    let mut info_hash = [0u8; 20];
    info_hash.copy_from_slice(&hash_bytes);

    let freeleech = params.freeleech != 0;
    state.torrents.insert(Torrent::new(
        params.id,
        info_hash,
        params.size,
        freeleech,
        params.freeleech_until,
    ));

    info!(
        torrent_id = params.id,
        info_hash = %params.info_hash,
        freeleech,
        "Torrent added"
    );
    Ok(ok("Torrent added successfully"))
}

/// GET /torrent/remove?api_key=<key>&id=<id>
pub async fn torrent_remove_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentRemoveQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    if state.torrents.remove(params.id).is_none() {
        return Err(AdminError::NotFound("Torrent not found".to_string()));
    }

    info!(torrent_id = params.id, "Torrent removed");
    Ok(ok("Torrent removed successfully"))
}

/// GET /user/add?api_key=<key>&id=<id>&banned=<0|1>&language=<tag>
pub async fn user_add_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserAddQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    let language = params
        .language
        .unwrap_or_else(|| crate::locale::DEFAULT_LANGUAGE.to_string());
    let mut user = User::new(params.id, params.banned != 0, language);
    if let Some(until) = params.double_upload_until {
        user = user.with_double_upload(until);
    }
    state.users.insert(user);

    info!(user_id = params.id, "User added");
    Ok(ok("User added successfully"))
}

/// GET /user/remove?api_key=<key>&id=<id>
pub async fn user_remove_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserRemoveQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    if state.users.remove(params.id).is_none() {
        return Err(AdminError::NotFound("User not found".to_string()));
    }

    info!(user_id = params.id, "User removed");
    Ok(ok("User removed successfully"))
}

/// GET /credential/add?api_key=<key>&token=<uuid>&user_id=<id>&torrent_id=<id>
pub async fn credential_add_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CredentialAddQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    state
        .credentials
        .insert(Credential::new(params.token, params.user_id, params.torrent_id));

    info!(
        user_id = params.user_id,
        torrent_id = params.torrent_id,
        "Credential added"
    );
    Ok(ok("Credential added successfully"))
}

/// GET /credential/revoke?api_key=<key>&token=<uuid>
pub async fn credential_revoke_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CredentialRevokeQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    if !state.credentials.revoke(&params.token) {
        return Err(AdminError::NotFound("Credential not found".to_string()));
    }

    info!("Credential revoked");
    Ok(ok("Credential revoked successfully"))
}

/// GET /client/ban?api_key=<key>&kind=<peer_prefix|user_agent>&pattern=<string>
pub async fn client_ban_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClientBanQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    match params.kind.as_str() {
        "peer_prefix" => state
            .client_bans
            .ban_peer_prefix(params.pattern.clone().into_bytes()),
        "user_agent" => state.client_bans.ban_user_agent(params.pattern.clone()),
        other => {
            return Err(AdminError::InvalidParameter(format!(
                "kind must be peer_prefix or user_agent, got {other}"
            )))
        }
    }

    info!(kind = %params.kind, pattern = %params.pattern, "Client ban added");
    Ok(ok("Client ban added successfully"))
}

/// GET /client/unban?api_key=<key>&kind=<peer_prefix|user_agent>&pattern=<string>
pub async fn client_unban_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClientBanQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    match params.kind.as_str() {
        "peer_prefix" => state.client_bans.unban_peer_prefix(params.pattern.as_bytes()),
        "user_agent" => state.client_bans.unban_user_agent(&params.pattern),
        other => {
            return Err(AdminError::InvalidParameter(format!(
                "kind must be peer_prefix or user_agent, got {other}"
            )))
        }
    }

    info!(kind = %params.kind, pattern = %params.pattern, "Client ban removed");
    Ok(ok("Client ban removed successfully"))
}

/// GET /client/list?api_key=<key>
pub async fn client_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    Ok((
        StatusCode::OK,
        Json(ClientBanListResponse {
            success: true,
            peer_prefixes: state.client_bans.list_peer_prefixes(),
            user_agents: state.client_bans.list_user_agents(),
        }),
    )
        .into_response())
}

/// GET /incidents?api_key=<key>&limit=<n>
pub async fn incidents_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IncidentsQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    Ok((StatusCode::OK, Json(state.cheats.recent(params.limit))).into_response())
}

/// GET /settings/update?api_key=<key>&global_freeleech=<0|1>&...
///
/// Builds a new settings snapshot from the current one plus the given
/// overrides and swaps it in. In-flight announces finish on the snapshot
/// they already took.
pub async fn settings_update_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SettingsUpdateQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    let mut settings = (*state.settings()).clone();
    if let Some(value) = params.announce_interval_secs {
        settings.announce_interval_secs = value;
    }
    if let Some(value) = params.min_announce_interval_secs {
        settings.min_announce_interval_secs = value;
    }
    if let Some(value) = params.enforced_min_announce_interval_secs {
        settings.enforced_min_announce_interval_secs = value;
    }
    if let Some(value) = params.global_freeleech {
        settings.global_freeleech = value != 0;
    }
    if let Some(value) = params.default_numwant {
        settings.default_numwant = value;
    }
    if let Some(value) = params.max_numwant {
        settings.max_numwant = value;
    }

    if settings.announce_interval_secs <= 0
        || settings.min_announce_interval_secs <= 0
        || settings.min_announce_interval_secs > settings.announce_interval_secs
        || settings.enforced_min_announce_interval_secs < 0
        || settings.enforced_min_announce_interval_secs > settings.min_announce_interval_secs
        || settings.default_numwant == 0
        || settings.max_numwant < settings.default_numwant
    {
        return Err(AdminError::InvalidParameter(
            "settings constraints violated".to_string(),
        ));
    }

    state.replace_settings(settings);

    info!("Tracker settings updated");
    Ok(ok("Settings updated successfully"))
}

/// POST /reload?api_key=<key>
///
/// Clears the user/torrent/credential stores and repopulates them from the
/// backend. Active swarms are untouched.
pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&params.api_key, &state)?;

    info!("Starting store reload from backend API");

    state.users.clear();
    state.torrents.clear();
    state.credentials.clear();

    populate_from_api(&state)
        .await
        .map_err(|e| AdminError::InternalError(e.to_string()))?;

    info!(
        users = state.users.len(),
        torrents = state.torrents.len(),
        credentials = state.credentials.len(),
        "Store reload completed"
    );
    Ok(ok("Reload completed successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{
        AntiCheatConfig, Config, LoggingConfig, SecurityConfig, ServerConfig, SyncConfig,
        TrackerSettings,
    };
    use uuid::Uuid;

    fn test_state() -> Arc<AppState> {
        let config = Config {
            server: ServerConfig {
                port: Some(6969),
                unix_socket: None,
                num_threads: 1,
                cleanup_interval: 300,
                peer_timeout: 3600,
            },
            tracker: TrackerSettings {
                announce_interval_secs: 1800,
                min_announce_interval_secs: 900,
                enforced_min_announce_interval_secs: 60,
                global_freeleech: false,
                default_numwant: 50,
                max_numwant: 200,
            },
            anti_cheat: AntiCheatConfig::default(),
            sync: SyncConfig {
                data_endpoint: "http://localhost:8000/api".to_string(),
                api_key: "test-key".to_string(),
                push_interval_secs: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "console".to_string(),
                console: true,
            },
            security: SecurityConfig::default(),
        };
        Arc::new(AppState::new(config).expect("state"))
    }

    #[tokio::test]
    async fn test_torrent_add_and_remove() {
        let state = test_state();

        let result = torrent_add_handler(
            State(Arc::clone(&state)),
            Query(TorrentAddQuery {
                api_key: "test-key".to_string(),
                id: 1,
                info_hash: "ab".repeat(20),
                size: 1 << 20,
                freeleech: 1,
                freeleech_until: None,
            }),
        )
        .await;
        assert!(result.is_ok());
        assert!(state.torrents.get(1).unwrap().is_freeleech);

        let result = torrent_remove_handler(
            State(Arc::clone(&state)),
            Query(TorrentRemoveQuery {
                api_key: "test-key".to_string(),
                id: 1,
            }),
        )
        .await;
        assert!(result.is_ok());
        assert!(state.torrents.get(1).is_none());
    }

    #[tokio::test]
    async fn test_bad_api_key_rejected() {
        let state = test_state();
        let result = torrent_remove_handler(
            State(state),
            Query(TorrentRemoveQuery {
                api_key: "wrong".to_string(),
                id: 1,
            }),
        )
        .await;
        assert!(matches!(result, Err(AdminError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_short_info_hash_rejected() {
        let state = test_state();
        let result = torrent_add_handler(
            State(state),
            Query(TorrentAddQuery {
                api_key: "test-key".to_string(),
                id: 1,
                info_hash: "abcd".to_string(),
                size: 0,
                freeleech: 0,
                freeleech_until: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(AdminError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_credential_revoke() {
        let state = test_state();
        let token = Uuid::new_v4();
        state.credentials.insert(Credential::new(token, 1, 1));

        let result = credential_revoke_handler(
            State(Arc::clone(&state)),
            Query(CredentialRevokeQuery {
                api_key: "test-key".to_string(),
                token,
            }),
        )
        .await;
        assert!(result.is_ok());
        assert!(state.credentials.resolve(&token).unwrap().is_revoked());
    }

    #[tokio::test]
    async fn test_settings_update_swaps_snapshot() {
        let state = test_state();
        let result = settings_update_handler(
            State(Arc::clone(&state)),
            Query(SettingsUpdateQuery {
                api_key: "test-key".to_string(),
                announce_interval_secs: None,
                min_announce_interval_secs: None,
                enforced_min_announce_interval_secs: None,
                global_freeleech: Some(1),
                default_numwant: None,
                max_numwant: None,
            }),
        )
        .await;
        assert!(result.is_ok());
        assert!(state.settings().global_freeleech);
    }

    #[tokio::test]
    async fn test_settings_update_rejects_bad_ordering() {
        let state = test_state();
        let result = settings_update_handler(
            State(state),
            Query(SettingsUpdateQuery {
                api_key: "test-key".to_string(),
                announce_interval_secs: Some(300),
                min_announce_interval_secs: None,
                enforced_min_announce_interval_secs: None,
                global_freeleech: None,
                default_numwant: None,
                max_numwant: None,
            }),
        )
        .await;
        // min interval (900) would exceed the new announce interval
        assert!(matches!(result, Err(AdminError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_client_ban_kinds() {
        let state = test_state();
        let result = client_ban_handler(
            State(Arc::clone(&state)),
            Query(ClientBanQuery {
                api_key: "test-key".to_string(),
                pattern: "-XL0012-".to_string(),
                kind: "peer_prefix".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());
        assert!(state.client_bans.is_banned(b"-XL0012-AAAAAAAAAAAA", "ok"));

        let result = client_ban_handler(
            State(state),
            Query(ClientBanQuery {
                api_key: "test-key".to_string(),
                pattern: "x".to_string(),
                kind: "something-else".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AdminError::InvalidParameter(_))));
    }
}
