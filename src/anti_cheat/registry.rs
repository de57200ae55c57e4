use crate::models::user::User;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// How many incidents are retained for the admin API.
const RETAINED_INCIDENTS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    SpeedCap,
    MultiLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheatIncident {
    pub user_id: u32,
    pub kind: IncidentKind,
    pub severity: Severity,
    pub details: String,
    pub torrent_id: Option<u32>,
    pub ip: Option<IpAddr>,
    pub recorded_at: i64,
}

/// Cheat incident log.
///
/// Incidents are logged at warn severity with structured fields, counted on
/// the offending user, and retained in a bounded buffer for the admin API.
pub struct CheatRegistry {
    incidents: Mutex<Vec<CheatIncident>>,
}

impl CheatRegistry {
    pub fn new() -> Self {
        Self {
            incidents: Mutex::new(Vec::new()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_incident(
        &self,
        user: &User,
        kind: IncidentKind,
        severity: Severity,
        details: String,
        torrent_id: Option<u32>,
        ip: Option<IpAddr>,
        now: i64,
    ) {
        let warnings = user.record_cheat_warning();

        warn!(
            user_id = user.id,
            torrent_id = torrent_id,
            kind = ?kind,
            severity = ?severity,
            warnings,
            details = %details,
            "Cheat incident recorded"
        );

        let incident = CheatIncident {
            user_id: user.id,
            kind,
            severity,
            details,
            torrent_id,
            ip,
            recorded_at: now,
        };

        let mut incidents = self
            .incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        incidents.push(incident);
        if incidents.len() > RETAINED_INCIDENTS {
            let overflow = incidents.len() - RETAINED_INCIDENTS;
            incidents.drain(..overflow);
        }
    }

    /// Most recent incidents, newest last.
    pub fn recent(&self, limit: usize) -> Vec<CheatIncident> {
        let incidents = self
            .incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let start = incidents.len().saturating_sub(limit);
        incidents[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CheatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
