use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// A per-(user, torrent) announce authorization token.
///
/// Issued by the download flow on the backend; the announce path resolves it,
/// honors revocation, and maintains the usage record.
#[derive(Debug)]
pub struct Credential {
    pub token: Uuid,
    pub user_id: u32,
    pub torrent_id: u32,
    revoked: AtomicBool,
    usage: Mutex<UsageRecord>,
}

/// Per-credential usage counters.
#[derive(Debug, Default, Clone)]
pub struct UsageRecord {
    pub announce_count: u64,
    pub first_used: Option<i64>,
    pub last_used: Option<i64>,
    pub uploaded_delta: u64,
    pub downloaded_delta: u64,
    pub last_ip: Option<IpAddr>,
    pub last_user_agent: Option<String>,
}

impl Credential {
    pub fn new(token: Uuid, user_id: u32, torrent_id: u32) -> Self {
        Self {
            token,
            user_id,
            torrent_id,
            revoked: AtomicBool::new(false),
            usage: Mutex::new(UsageRecord::default()),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Relaxed)
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Relaxed);
    }

    /// Record one announce against this credential.
    pub fn record_use(
        &self,
        now: i64,
        uploaded_delta: u64,
        downloaded_delta: u64,
        ip: IpAddr,
        user_agent: &str,
    ) {
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        usage.announce_count += 1;
        usage.first_used.get_or_insert(now);
        usage.last_used = Some(now);
        usage.uploaded_delta += uploaded_delta;
        usage.downloaded_delta += downloaded_delta;
        usage.last_ip = Some(ip);
        usage.last_user_agent = Some(user_agent.to_string());
    }

    pub fn usage(&self) -> UsageRecord {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
