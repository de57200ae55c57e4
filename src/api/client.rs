use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// HTTP client for the backend that owns users, torrents, and credentials.
///
/// The tracker pulls the full dataset on startup and on the periodic sync
/// tick, and pushes peer and usage snapshots back the other way.
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiData {
    pub torrents: Vec<ApiTorrent>,
    pub users: Vec<ApiUser>,
    pub credentials: Vec<ApiCredential>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTorrent {
    pub id: u32,
    pub info_hash: String, // hex-encoded
    pub size: u64,
    pub is_freeleech: bool,
    #[serde(default)]
    pub freeleech_until: Option<i64>,
    #[serde(default)]
    pub snatched: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub id: u32,
    pub is_banned: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub uploaded: u64,
    #[serde(default)]
    pub downloaded: u64,
    #[serde(default)]
    pub nominal_uploaded: u64,
    #[serde(default)]
    pub nominal_downloaded: u64,
    #[serde(default)]
    pub double_upload_until: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCredential {
    pub token: Uuid,
    pub user_id: u32,
    pub torrent_id: u32,
    #[serde(default)]
    pub revoked: bool,
}

fn default_language() -> String {
    crate::locale::DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Serialize)]
pub struct UpdateData {
    pub peers: Vec<PeerUpdate>,
    pub torrents: Vec<TorrentUpdate>,
    pub users: Vec<UserUpdate>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct PeerUpdate {
    pub torrent_id: u32,
    pub user_id: u32,
    pub peer_id: String, // hex-encoded
    pub ip: String,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: i64,
    pub last_announce: i64,
    pub user_agent: String,
}

#[derive(Debug, Serialize)]
pub struct TorrentUpdate {
    pub torrent_id: u32,
    pub seeders: u32,
    pub leechers: u32,
    pub snatched: u32,
}

#[derive(Debug, Serialize)]
pub struct UserUpdate {
    pub user_id: u32,
    pub uploaded: u64,
    pub downloaded: u64,
    pub nominal_uploaded: u64,
    pub nominal_downloaded: u64,
    pub seed_minutes: u64,
    pub leech_minutes: u64,
    pub cheat_warnings: u32,
}

impl ApiClient {
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Fetch the full user/torrent/credential dataset from the backend.
    pub async fn fetch_data(&self) -> Result<ApiData> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("api_key", &self.api_key)])
            .send()
            .await
            .context("Failed to send request to backend API")?;

        if !response.status().is_success() {
            bail!("Backend API returned error status: {}", response.status());
        }

        response
            .json::<ApiData>()
            .await
            .context("Failed to parse JSON response from backend API")
    }

    /// Push the current peer and counter snapshot back to the backend.
    pub async fn upload_snapshot(&self, data: UpdateData) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("api_key", &self.api_key)])
            .json(&data)
            .send()
            .await
            .context("Failed to send snapshot to backend API")?;

        if !response.status().is_success() {
            bail!("Backend API returned error status: {}", response.status());
        }

        Ok(())
    }
}
