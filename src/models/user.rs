use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// The slice of a user account the announce path needs.
///
/// Counter fields are atomics so accumulation does not require replacing the
/// record; announces for the same user/torrent pair are additionally
/// serialized by the swarm registry's pair lock.
#[derive(Debug)]
pub struct User {
    /// User ID
    pub id: u32,
    /// Whether the account may announce at all
    pub is_banned: bool,
    /// BCP-47-ish language tag used for localized failure reasons
    pub language: String,
    /// Raw uploaded bytes (ratio display)
    uploaded: AtomicU64,
    /// Raw downloaded bytes (ratio display)
    downloaded: AtomicU64,
    /// Economically counted upload, after multipliers
    nominal_uploaded: AtomicU64,
    /// Economically counted download, after freeleech
    nominal_downloaded: AtomicU64,
    /// Total minutes spent seeding
    seed_minutes: AtomicU64,
    /// Total minutes spent leeching
    leech_minutes: AtomicU64,
    /// Double-upload bonus flag; cleared lazily when found expired
    double_upload_active: AtomicBool,
    /// Unix timestamp at which the double-upload bonus ends
    pub double_upload_until: i64,
    /// Anti-cheat incidents recorded against this user
    cheat_warnings: AtomicU32,
}

/// Deltas applied to a user record in one announce transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserDeltas {
    pub uploaded: u64,
    pub downloaded: u64,
    pub nominal_uploaded: u64,
    pub nominal_downloaded: u64,
    pub seed_minutes: u64,
    pub leech_minutes: u64,
}

impl User {
    pub fn new(id: u32, is_banned: bool, language: String) -> Self {
        Self {
            id,
            is_banned,
            language,
            uploaded: AtomicU64::new(0),
            downloaded: AtomicU64::new(0),
            nominal_uploaded: AtomicU64::new(0),
            nominal_downloaded: AtomicU64::new(0),
            seed_minutes: AtomicU64::new(0),
            leech_minutes: AtomicU64::new(0),
            double_upload_active: AtomicBool::new(false),
            double_upload_until: 0,
            cheat_warnings: AtomicU32::new(0),
        }
    }

    pub fn with_double_upload(mut self, until: i64) -> Self {
        self.double_upload_active = AtomicBool::new(true);
        self.double_upload_until = until;
        self
    }

    pub fn seed_totals(
        &self,
        uploaded: u64,
        downloaded: u64,
        nominal_uploaded: u64,
        nominal_downloaded: u64,
    ) {
        self.uploaded.store(uploaded, Ordering::Relaxed);
        self.downloaded.store(downloaded, Ordering::Relaxed);
        self.nominal_uploaded.store(nominal_uploaded, Ordering::Relaxed);
        self.nominal_downloaded
            .store(nominal_downloaded, Ordering::Relaxed);
    }

    pub fn apply(&self, deltas: &UserDeltas) {
        self.uploaded.fetch_add(deltas.uploaded, Ordering::Relaxed);
        self.downloaded
            .fetch_add(deltas.downloaded, Ordering::Relaxed);
        self.nominal_uploaded
            .fetch_add(deltas.nominal_uploaded, Ordering::Relaxed);
        self.nominal_downloaded
            .fetch_add(deltas.nominal_downloaded, Ordering::Relaxed);
        self.seed_minutes
            .fetch_add(deltas.seed_minutes, Ordering::Relaxed);
        self.leech_minutes
            .fetch_add(deltas.leech_minutes, Ordering::Relaxed);
    }

    pub fn double_upload_active(&self) -> bool {
        self.double_upload_active.load(Ordering::Relaxed)
    }

    pub fn clear_double_upload(&self) {
        self.double_upload_active.store(false, Ordering::Relaxed);
    }

    pub fn record_cheat_warning(&self) -> u32 {
        self.cheat_warnings.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn cheat_warnings(&self) -> u32 {
        self.cheat_warnings.load(Ordering::Relaxed)
    }

    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    pub fn nominal_uploaded(&self) -> u64 {
        self.nominal_uploaded.load(Ordering::Relaxed)
    }

    pub fn nominal_downloaded(&self) -> u64 {
        self.nominal_downloaded.load(Ordering::Relaxed)
    }

    pub fn seed_minutes(&self) -> u64 {
        self.seed_minutes.load(Ordering::Relaxed)
    }

    pub fn leech_minutes(&self) -> u64 {
        self.leech_minutes.load(Ordering::Relaxed)
    }
}
