use crate::models::user::User;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory user records keyed by id.
pub struct UserStore {
    users: DashMap<u32, Arc<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }


    pub fn insert(&self, user: User) {
        self.users.insert(user.id, Arc::new(user));
    }

    pub fn remove(&self, id: u32) -> Option<Arc<User>> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    pub fn get(&self, id: u32) -> Option<Arc<User>> {
        self.users.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn all(&self) -> Vec<Arc<User>> {
        self.users.iter().map(|e| Arc::clone(e.value())).collect()
    }

    pub fn clear(&self) {
        self.users.clear();
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
