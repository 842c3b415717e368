use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{NewUser, User, UserStore};
use crate::error::StoreError;

#[derive(Default)]
struct Users {
    by_email: HashMap<String, User>,
    next_id: i64,
}

/// Process-local user store keyed by email
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Users>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.by_email.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("user map lock poisoned".to_string()))?;
        Ok(users.by_email.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("user map lock poisoned".to_string()))?;
        Ok(users.by_email.contains_key(email))
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Unavailable("user map lock poisoned".to_string()))?;

        // Uniqueness is checked under the write lock
        if users.by_email.contains_key(&user.email) {
            return Err(StoreError::Duplicate);
        }

        users.next_id += 1;
        let now = Utc::now();
        let stored = User {
            id: users.next_id,
            name: user.name,
            contact_number: user.contact_number,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.by_email.insert(stored.email.clone(), stored.clone());

        Ok(stored)
    }
}
