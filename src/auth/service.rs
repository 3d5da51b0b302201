//! Account operations: signup, signin, profile fetch and profile update.
//!
//! Each operation is independent; the only shared state is the user store.

use super::error::{AccountError, StorageError};
use super::password::PasswordHasher;
use super::store::{UserChanges, UserRecord, UserStore};
use super::token::TokenService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Partial profile update. Absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "profileURL")]
    pub profile_url: Option<String>,
}

/// A user as returned to clients. Has no password field by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    #[serde(rename = "profileURL", skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            phone_number: record.phone_number,
            address: record.address,
            profile_url: record.profile_url,
        }
    }
}

pub struct AccountService {
    store: Arc<UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: Arc<UserStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Register a user. Returns the new user id.
    pub async fn signup(&self, request: SignupRequest) -> Result<String, AccountError> {
        if request.username.trim().is_empty() {
            return Err(AccountError::Validation("Username cannot be empty".into()));
        }
        if request.password.trim().is_empty() {
            return Err(AccountError::Validation("Password cannot be empty".into()));
        }
        // Cheap early rejection; the authoritative check runs inside `insert`.
        if self.store.find_by_username(&request.username).is_some() {
            return Err(AccountError::Conflict(request.username));
        }

        let password_hash = self.hash_password(request.password).await?;
        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: request.username,
            password_hash,
            email: request.email,
            phone_number: request.phone_number,
            address: request.address,
            profile_url: None,
        };
        let id = record.id.clone();
        self.with_store(move |store| store.insert(record)).await?;
        Ok(id)
    }

    /// Check credentials and issue an access token.
    pub async fn signin(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let user = self
            .store
            .find_by_username(username)
            .ok_or(AccountError::UnknownUser)?;

        let hasher = self.hasher;
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AccountError::Hashing(format!("Task join error: {e}")))??;

        if !matches {
            tracing::debug!(username = %username, "Sign-in rejected: wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(self.tokens.issue(&user.id)?)
    }

    /// Resolve a bearer token to the user id it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<String, AccountError> {
        Ok(self.tokens.verify(token)?)
    }

    pub fn get_profile(&self, token: &str) -> Result<UserProfile, AccountError> {
        let user_id = self.authenticate(token)?;
        self.store
            .find_by_id(&user_id)
            .map(UserProfile::from)
            .ok_or(AccountError::NotFound)
    }

    /// Apply a partial update to the token holder's record.
    ///
    /// Changing `username` does not re-check uniqueness.
    pub async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        let user_id = self.authenticate(token)?;
        if self.store.find_by_id(&user_id).is_none() {
            return Err(AccountError::NotFound);
        }

        let password_hash = match present(update.password) {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            username: present(update.username),
            password_hash,
            email: present(update.email),
            phone_number: present(update.phone_number),
            address: present(update.address),
            profile_url: present(update.profile_url),
        };

        let id = user_id.clone();
        let updated = self
            .with_store(move |store| store.update(&id, changes))
            .await?;
        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(updated.into())
    }

    /// Run a store mutation on the blocking pool. Writes hold the document
    /// lock across a file sync, which must not stall an async worker.
    async fn with_store<T, F>(&self, op: F) -> Result<T, AccountError>
    where
        F: FnOnce(&UserStore) -> Result<T, AccountError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AccountError::Hashing(format!("Task join error: {e}")))?
    }
}

/// Empty strings count as "not provided".
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
