//! Owner accounts: registration, login, refresh, password and profile

use async_trait::async_trait;
use chrono::Utc;
use sampatti_core::{AccessError, ProfileUpdate, Result, SecretVerifier, User};
use sampatti_credentials::{CredentialError, SubjectDirectory, TokenCodec, TokenPair};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::{StorageError, VaultStore};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Resolves refresh-token subjects against the user table
#[derive(Debug, Clone)]
pub struct StoreDirectory {
    store: Arc<dyn VaultStore>,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubjectDirectory for StoreDirectory {
    async fn owner_exists(&self, user_id: Uuid) -> sampatti_credentials::Result<bool> {
        self.store
            .get_user(user_id)
            .await
            .map(|u| u.is_some())
            .map_err(|e| CredentialError::Directory(e.to_string()))
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccessError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Accounts {
    store: Arc<dyn VaultStore>,
    secrets: Arc<dyn SecretVerifier>,
    codec: Arc<TokenCodec>,
    directory: StoreDirectory,
}

impl Accounts {
    pub fn new(
        store: Arc<dyn VaultStore>,
        secrets: Arc<dyn SecretVerifier>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        let directory = StoreDirectory::new(store.clone());
        Self {
            store,
            secrets,
            codec,
            directory,
        }
    }

    pub async fn register(&self, mut registration: Registration) -> Result<User> {
        registration.email = registration.email.trim().to_string();
        if registration.name.trim().is_empty() {
            return Err(AccessError::InvalidInput("name is required".into()));
        }
        if !registration.email.contains('@') {
            return Err(AccessError::InvalidInput("invalid email".into()));
        }
        if self
            .store
            .get_user_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AccessError::UserExists);
        }
        check_password(&registration.password)?;

        let hash = self.secrets.hash(&registration.password)?;
        let user = User::new(
            registration.name,
            registration.email,
            registration.phone_number,
            hash,
        );

        match self.store.create_user(user.clone()).await {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => return Err(AccessError::UserExists),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let mut user = match self.store.get_user_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                warn!("Login for unknown email");
                return Err(AccessError::InvalidCredentials);
            }
        };

        if !self.secrets.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(AccessError::InvalidCredentials);
        }

        let now = Utc::now();
        self.store.record_login(user.id, now).await?;
        user.last_login = Some(now);

        let tokens = self.codec.issue_owner_tokens(user.id)?;
        info!(user_id = %user.id, "User logged in");

        Ok(Session {
            tokens,
            token_type: "Bearer",
            expires_in: self.codec.access_ttl().num_seconds(),
            user,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        Ok(self
            .codec
            .refresh_owner_access_token(refresh_token, &self.directory)
            .await?)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        if !self.secrets.verify(current_password, &user.password_hash) {
            warn!(user_id = %user_id, "Password change with wrong current password");
            return Err(AccessError::InvalidCredentials);
        }
        check_password(new_password)?;

        let hash = self.secrets.hash(new_password)?;
        if !self.store.update_password_hash(user_id, &hash).await? {
            return Err(AccessError::UserNotFound);
        }

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        if update.name.trim().is_empty() {
            return Err(AccessError::InvalidInput("name is required".into()));
        }
        if !self.store.update_user_profile(user_id, &update).await? {
            return Err(AccessError::UserNotFound);
        }
        self.profile(user_id).await
    }
}
