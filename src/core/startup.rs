use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::state::AppState;
use crate::models::credential::Credential;
use crate::models::torrent::Torrent;
use crate::models::user::User;

/// Fetch the backend dataset and fill the stores.
///
/// Runs at boot and on an admin-triggered reload. Records with malformed
/// fields are skipped with a warning rather than failing the whole load.
pub async fn populate_from_api(state: &AppState) -> Result<()> {
    let data = state
        .api
        .fetch_data()
        .await
        .context("Failed to fetch dataset from backend API")?;

    info!(
        torrents = data.torrents.len(),
        users = data.users.len(),
        credentials = data.credentials.len(),
        "Dataset fetched from backend API"
    );

    for api_torrent in data.torrents {
        match hex::decode(&api_torrent.info_hash) {
            Ok(hash_bytes) if hash_bytes.len() == 20 => {
                let mut info_hash = [0u8; 20];
                info_hash.copy_from_slice(&hash_bytes);

                let torrent = Torrent::new(
                    api_torrent.id,
                    info_hash,
                    api_torrent.size,
                    api_torrent.is_freeleech,
                    api_torrent.freeleech_until,
                );
                torrent.set_snatched(api_torrent.snatched);
                state.torrents.insert(torrent);
            }
            Ok(hash_bytes) => {
                warn!(
                    torrent_id = api_torrent.id,
                    length = hash_bytes.len(),
                    "Invalid info_hash length, skipping torrent"
                );
            }
            Err(e) => {
                warn!(
                    torrent_id = api_torrent.id,
                    error = %e,
                    "Failed to decode info_hash, skipping torrent"
                );
            }
        }
    }

    for api_user in data.users {
        let mut user = User::new(api_user.id, api_user.is_banned, api_user.language);
        if let Some(until) = api_user.double_upload_until {
            user = user.with_double_upload(until);
        }
        user.seed_totals(
            api_user.uploaded,
            api_user.downloaded,
            api_user.nominal_uploaded,
            api_user.nominal_downloaded,
        );
        state.users.insert(user);
    }

    for api_credential in data.credentials {
        let credential = Credential::new(
            api_credential.token,
            api_credential.user_id,
            api_credential.torrent_id,
        );
        if api_credential.revoked {
            credential.revoke();
        }
        state.credentials.insert(credential);
    }

    info!(
        torrents = state.torrents.len(),
        users = state.users.len(),
        credentials = state.credentials.len(),
        "Stores populated from backend API"
    );

    Ok(())
}
