// Centralized error handling for the tracker

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::locale::MessageKey;

/// Announce request parameter failures, rejected before any store access.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("info_hash must decode to exactly 20 bytes")]
    InvalidInfoHash,

    #[error("peer_id must decode to exactly 20 bytes")]
    InvalidPeerId,

    #[error("Credential token is not a well-formed UUID")]
    InvalidCredential,

    #[error("Invalid value for parameter: {0}")]
    InvalidValue(&'static str),

    #[error("Port must be between 1 and 65535")]
    InvalidPort,

    #[error("Event must be 'started', 'stopped', 'completed', or empty")]
    InvalidEvent,
}

/// Everything that can end an announce request without a peer list.
///
/// All of these surface to the client as HTTP 200 with a bencoded
/// `failure reason` body (tracker convention); the taxonomy exists for
/// logging, metrics, and localization.
#[derive(Error, Debug)]
pub enum AnnounceError {
    #[error("This is a BitTorrent tracker announce URL. Add it to your torrent client; the client sends the required parameters automatically.")]
    BrowserAccess,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown credential")]
    UnknownCredential,

    #[error("Credential has been revoked")]
    CredentialRevoked,

    #[error("Account is banned from announcing")]
    AccountBanned,

    #[error("Client is banned")]
    ClientBanned,

    #[error("Torrent not found")]
    TorrentNotFound,

    #[error("Announced too soon: {elapsed}s elapsed, {enforced_min}s required")]
    RateLimited {
        elapsed: i64,
        enforced_min: i64,
        interval: i64,
        min_interval: i64,
    },

    #[error("Upload speed {speed_kibps:.0} KiB/s exceeds cap {cap_kibps:.0} KiB/s")]
    SpeedCapExceeded { speed_kibps: f64, cap_kibps: f64 },

    #[error("Too many locations for this torrent")]
    MultiLocation,
}

impl AnnounceError {
    /// Stable name for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnnounceError::BrowserAccess => "browser_access",
            AnnounceError::Validation(_) => "validation",
            AnnounceError::UnknownCredential => "unknown_credential",
            AnnounceError::CredentialRevoked => "credential_revoked",
            AnnounceError::AccountBanned => "account_banned",
            AnnounceError::ClientBanned => "client_banned",
            AnnounceError::TorrentNotFound => "torrent_not_found",
            AnnounceError::RateLimited { .. } => "rate_limited",
            AnnounceError::SpeedCapExceeded { .. } => "speed_cap",
            AnnounceError::MultiLocation => "multi_location",
        }
    }

    /// Localization key for the user-facing failure reason.
    pub fn message_key(&self) -> MessageKey {
        match self {
            AnnounceError::BrowserAccess => MessageKey::BrowserAccess,
            AnnounceError::Validation(_) => MessageKey::InvalidParameters,
            AnnounceError::UnknownCredential => MessageKey::InvalidCredential,
            AnnounceError::CredentialRevoked => MessageKey::CredentialRevoked,
            AnnounceError::AccountBanned => MessageKey::AccountBanned,
            AnnounceError::ClientBanned => MessageKey::ClientBanned,
            AnnounceError::TorrentNotFound => MessageKey::TorrentNotFound,
            AnnounceError::RateLimited { .. } => MessageKey::RateLimited,
            AnnounceError::SpeedCapExceeded { .. } => MessageKey::SpeedCapExceeded,
            AnnounceError::MultiLocation => MessageKey::MultiLocation,
        }
    }

    /// Interval hints echoed in the failure body so well-behaved clients
    /// self-correct their announce cadence.
    pub fn interval_hints(&self) -> Option<(i64, i64)> {
        match self {
            AnnounceError::RateLimited {
                interval,
                min_interval,
                ..
            } => Some((*interval, *min_interval)),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        use crate::models::admin::ErrorResponse;
        use axum::response::Json;

        let status = match &self {
            AdminError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AdminError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            MonitoringError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        (status, message).into_response()
    }
}
