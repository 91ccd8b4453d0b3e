//! Account lookups used by the auth flows.
//!
//! [`PgUserStore`] is used when `DATABASE_URL` is set; [`MemoryUserStore`]
//! backs development runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use tessera_core::AppError;

use super::model::{ContactChannel, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("User not found: {0}")]
    NotFound(String),
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        AppError::internal(anyhow::Error::new(err))
    }
}

#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, UserStoreError>;

    /// Looks up by email (case-insensitive) or phone number.
    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, UserStoreError>;

    async fn mark_channel_verified(
        &self,
        user_id: Uuid,
        channel: ContactChannel,
    ) -> Result<(), UserStoreError>;

    async fn touch_last_sign_in(&self, user_id: Uuid) -> Result<(), UserStoreError>;
}

const USER_COLUMNS: &str = "user_id, email, phone_number, user_name, first_name, last_name, \
     language, password_hash, is_active, is_verified, is_email_verified, is_phone_verified, \
     permissions, groups, last_sign_in_at";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, UserStoreError> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self::new(db))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let identifier = identifier.trim();

        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) OR phone_number = $1 LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn mark_channel_verified(
        &self,
        user_id: Uuid,
        channel: ContactChannel,
    ) -> Result<(), UserStoreError> {
        let query = match channel {
            ContactChannel::Email => {
                "UPDATE users SET is_email_verified = TRUE, email_verified_at = NOW(), updated_at = NOW() WHERE user_id = $1"
            }
            ContactChannel::Phone => {
                "UPDATE users SET is_phone_verified = TRUE, phone_number_verified_at = NOW(), updated_at = NOW() WHERE user_id = $1"
            }
        };

        let result = sqlx::query(query).bind(user_id).execute(&self.db).await?;
        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(user_id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn touch_last_sign_in(&self, user_id: Uuid) -> Result<(), UserStoreError> {
        sqlx::query("UPDATE users SET last_sign_in_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.user_id, u)).collect()),
        }
    }

    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.user_id, user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.matches_login(identifier))
            .cloned())
    }

    async fn mark_channel_verified(
        &self,
        user_id: Uuid,
        channel: ContactChannel,
    ) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        users
            .get_mut(&user_id)
            .ok_or_else(|| UserStoreError::NotFound(user_id.to_string()))?
            .mark_verified(channel);
        Ok(())
    }

    async fn touch_last_sign_in(&self, user_id: Uuid) -> Result<(), UserStoreError> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.last_sign_in_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> UserRecord {
        UserRecord {
            user_id: Uuid::new_v4(),
            email: Some(email.to_string()),
            phone_number: None,
            user_name: None,
            first_name: None,
            last_name: None,
            language: None,
            password_hash: None,
            is_active: true,
            is_verified: true,
            is_email_verified: false,
            is_phone_verified: false,
            permissions: vec![],
            groups: vec![],
            last_sign_in_at: None,
        }
    }

    #[tokio::test]
    async fn test_memory_lookup_by_id_and_login() {
        let ada = user("ada@example.com");
        let store = MemoryUserStore::new([ada.clone()]);

        let by_id = store.find_by_id(&ada.user_id.to_string()).await.unwrap();
        assert_eq!(by_id, Some(ada.clone()));

        let by_login = store.find_by_login("ADA@example.com").await.unwrap();
        assert_eq!(by_login.map(|u| u.user_id), Some(ada.user_id));

        assert!(store.find_by_id("not-a-uuid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_mark_channel_verified() {
        let ada = user("ada@example.com");
        let store = MemoryUserStore::new([ada.clone()]);

        store
            .mark_channel_verified(ada.user_id, ContactChannel::Email)
            .await
            .unwrap();
        store.touch_last_sign_in(ada.user_id).await.unwrap();

        let updated = store.find_by_id(&ada.user_id.to_string()).await.unwrap().unwrap();
        assert!(updated.is_email_verified);
        assert!(!updated.is_phone_verified);
        assert!(updated.last_sign_in_at.is_some());
    }

    #[tokio::test]
    async fn test_memory_mark_unknown_user_fails() {
        let store = MemoryUserStore::default();
        let result = store
            .mark_channel_verified(Uuid::new_v4(), ContactChannel::Phone)
            .await;
        assert!(matches!(result, Err(UserStoreError::NotFound(_))));
    }
}
