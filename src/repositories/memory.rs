use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::user::UserStore;
use crate::{
    error::{AppError, Result},
    models::user::{NewUser, User},
};

/// An in-process `UserStore`.
///
/// The uniqueness check and the insert happen under one lock. The store can
/// be switched offline to exercise `StoreUnavailable` handling.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    offline: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreUnavailable` (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check_online()?;
        Ok(self.lock().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        self.check_online()?;
        Ok(self.lock().get(&user_id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        self.check_online()?;
        let mut users = self.lock();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
