use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct TorrentAddQuery {
    pub api_key: String,
    pub id: u32,
    pub info_hash: String, // hex-encoded
    pub size: u64,
    #[serde(default)]
    pub freeleech: u8,
    #[serde(default)]
    pub freeleech_until: Option<i64>,
}

#[derive(Deserialize)]
pub struct TorrentRemoveQuery {
    pub api_key: String,
    pub id: u32,
}

#[derive(Deserialize)]
pub struct UserAddQuery {
    pub api_key: String,
    pub id: u32,
    #[serde(default)]
    pub banned: u8,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub double_upload_until: Option<i64>,
}

#[derive(Deserialize)]
pub struct UserRemoveQuery {
    pub api_key: String,
    pub id: u32,
}

#[derive(Deserialize)]
pub struct CredentialAddQuery {
    pub api_key: String,
    pub token: Uuid,
    pub user_id: u32,
    pub torrent_id: u32,
}

#[derive(Deserialize)]
pub struct CredentialRevokeQuery {
    pub api_key: String,
    pub token: Uuid,
}

#[derive(Deserialize)]
pub struct ClientBanQuery {
    pub api_key: String,
    /// Peer-id prefix ("-XL0012-") or user-agent substring
    pub pattern: String,
    /// "peer_prefix" or "user_agent"
    pub kind: String,
}

#[derive(Deserialize)]
pub struct IncidentsQuery {
    pub api_key: String,
    #[serde(default = "default_incident_limit")]
    pub limit: usize,
}

fn default_incident_limit() -> usize {
    100
}

#[derive(Deserialize)]
pub struct SettingsUpdateQuery {
    pub api_key: String,
    #[serde(default)]
    pub announce_interval_secs: Option<i64>,
    #[serde(default)]
    pub min_announce_interval_secs: Option<i64>,
    #[serde(default)]
    pub enforced_min_announce_interval_secs: Option<i64>,
    #[serde(default)]
    pub global_freeleech: Option<u8>,
    #[serde(default)]
    pub default_numwant: Option<u32>,
    #[serde(default)]
    pub max_numwant: Option<u32>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct ClientBanListResponse {
    pub success: bool,
    pub peer_prefixes: Vec<String>,
    pub user_agents: Vec<String>,
}
