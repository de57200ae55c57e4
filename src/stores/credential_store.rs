use crate::models::credential::Credential;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Resolves announce credentials to their (user, torrent) binding.
pub struct CredentialStore {
    credentials: DashMap<Uuid, Arc<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            credentials: DashMap::new(),
        }
    }


    pub fn insert(&self, credential: Credential) {
        self.credentials
            .insert(credential.token, Arc::new(credential));
    }

    /// Resolve a token. Revoked credentials still resolve; the caller decides
    /// how to report them (the announce path rejects before any lookup).
    pub fn resolve(&self, token: &Uuid) -> Option<Arc<Credential>> {
        self.credentials
            .get(token)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn revoke(&self, token: &Uuid) -> bool {
        match self.credentials.get(token) {
            Some(entry) => {
                entry.value().revoke();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, token: &Uuid) -> Option<Arc<Credential>> {
        self.credentials.remove(token).map(|(_, cred)| cred)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn all(&self) -> Vec<Arc<Credential>> {
        self.credentials
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect()
    }

    pub fn clear(&self) {
        self.credentials.clear();
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
