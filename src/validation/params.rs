use crate::core::config::TrackerSettings;
use crate::core::error::ValidationError;
use crate::utils::query::{percent_decode, raw_pairs};
use uuid::Uuid;

/// Raw announce query parameters, exactly as the client sent them.
///
/// Collected by hand from the raw query string: `info_hash` and `peer_id`
/// are percent-encoded arbitrary bytes and must never round-trip through a
/// lossy string decode.
#[derive(Debug, Default)]
pub struct AnnounceParams {
    pub credential: Option<String>,
    pub info_hash: Option<String>,
    pub peer_id: Option<String>,
    pub port: Option<String>,
    pub uploaded: Option<String>,
    pub downloaded: Option<String>,
    pub left: Option<String>,
    pub event: Option<String>,
    pub numwant: Option<String>,
    pub compact: Option<String>,
}

/// A fully validated announce request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub credential: Uuid,
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    /// Negative values mean the client reported an unknown amount
    pub left: i64,
    pub event: Option<AnnounceEvent>,
    pub numwant: usize,
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceEvent {
    Started,
    Stopped,
    Completed,
}

impl AnnounceParams {
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in raw_pairs(query) {
            match key {
                "credential" => params.credential = Some(value.to_string()),
                "info_hash" => params.info_hash = Some(value.to_string()),
                "peer_id" => params.peer_id = Some(value.to_string()),
                "port" => params.port = Some(value.to_string()),
                "uploaded" => params.uploaded = Some(value.to_string()),
                "downloaded" => params.downloaded = Some(value.to_string()),
                "left" => params.left = Some(value.to_string()),
                "event" => params.event = Some(value.to_string()),
                "numwant" => params.numwant = Some(value.to_string()),
                "compact" => params.compact = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    /// Whether this looks like a browser hitting the announce URL rather
    /// than a torrent client (no client parameters at all).
    pub fn looks_like_browser(&self) -> bool {
        self.info_hash.is_none() && self.peer_id.is_none()
    }

    /// Validate into a typed request. Settings supply the numwant default
    /// and ceiling.
    pub fn normalize(&self, settings: &TrackerSettings) -> Result<AnnounceRequest, ValidationError> {
        let credential = self.normalize_credential()?;
        let info_hash = self.normalize_info_hash()?;
        let peer_id = self.normalize_peer_id()?;
        let port = self.normalize_port()?;

        let uploaded = parse_u64(self.uploaded.as_deref(), "uploaded")?;
        let downloaded = parse_u64(self.downloaded.as_deref(), "downloaded")?;
        let left = self
            .left
            .as_deref()
            .ok_or(ValidationError::MissingParameter("left"))?
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidValue("left"))?;

        let event = self.normalize_event()?;
        let numwant = self.normalize_numwant(settings);
        let compact = self.compact.as_deref() == Some("1");

        Ok(AnnounceRequest {
            credential,
            info_hash,
            peer_id,
            port,
            uploaded,
            downloaded,
            left,
            event,
            numwant,
            compact,
        })
    }

    fn normalize_credential(&self) -> Result<Uuid, ValidationError> {
        let raw = self
            .credential
            .as_deref()
            .ok_or(ValidationError::MissingParameter("credential"))?;
        Uuid::try_parse(raw).map_err(|_| ValidationError::InvalidCredential)
    }

    /// Accepts the raw 20-byte form (percent-encoded) and the 40-character
    /// hex form; both canonicalize to the same hash bytes.
    fn normalize_info_hash(&self) -> Result<[u8; 20], ValidationError> {
        let raw = self
            .info_hash
            .as_deref()
            .ok_or(ValidationError::MissingParameter("info_hash"))?;
        let decoded =
            percent_decode(raw).map_err(|_| ValidationError::InvalidInfoHash)?;

        let bytes: Vec<u8> = if decoded.len() == 20 {
            decoded
        } else if decoded.len() == 40 {
            let text = std::str::from_utf8(&decoded)
                .map_err(|_| ValidationError::InvalidInfoHash)?;
            hex::decode(text).map_err(|_| ValidationError::InvalidInfoHash)?
        } else {
            return Err(ValidationError::InvalidInfoHash);
        };

        bytes
            .try_into()
            .map_err(|_| ValidationError::InvalidInfoHash)
    }

    fn normalize_peer_id(&self) -> Result<[u8; 20], ValidationError> {
        let raw = self
            .peer_id
            .as_deref()
            .ok_or(ValidationError::MissingParameter("peer_id"))?;
        let decoded = percent_decode(raw).map_err(|_| ValidationError::InvalidPeerId)?;
        decoded
            .try_into()
            .map_err(|_| ValidationError::InvalidPeerId)
    }

    fn normalize_port(&self) -> Result<u16, ValidationError> {
        let port = self
            .port
            .as_deref()
            .ok_or(ValidationError::MissingParameter("port"))?
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPort)?;
        if port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(port)
    }

    fn normalize_event(&self) -> Result<Option<AnnounceEvent>, ValidationError> {
        match self.event.as_deref() {
            None | Some("") => Ok(None),
            Some("started") => Ok(Some(AnnounceEvent::Started)),
            Some("stopped") => Ok(Some(AnnounceEvent::Stopped)),
            Some("completed") => Ok(Some(AnnounceEvent::Completed)),
            Some(_) => Err(ValidationError::InvalidEvent),
        }
    }

    /// Absent or unparsable numwant falls back to the configured default;
    /// the result is clamped to the configured ceiling to bound response
    /// size.
    fn normalize_numwant(&self, settings: &TrackerSettings) -> usize {
        let requested = self
            .numwant
            .as_deref()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(settings.default_numwant);
        requested.min(settings.max_numwant) as usize
    }
}

fn parse_u64(value: Option<&str>, name: &'static str) -> Result<u64, ValidationError> {
    value
        .ok_or(ValidationError::MissingParameter(name))?
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidValue(name))
}
