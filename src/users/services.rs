use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    repo::UserStore,
    repo_types::{normalize_email, NewUser, UserRecord},
};
use crate::{
    auth::{jwt::JwtKeys, password::PasswordHasher},
    errors::AppError,
};

/// Record-level operations: validation, hash-on-write and lookups.
#[derive(Clone)]
pub struct UserModel {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
}

impl UserModel {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Validates and persists a new user.
    ///
    /// The email lookup up front only short-circuits the common case; the store's
    /// unique index decides races between concurrent registrations.
    pub async fn create(&self, new: NewUser) -> Result<UserRecord, AppError> {
        let (mut record, mut errors) = UserRecord::from_new(new);
        for v in record.collect_violations() {
            if !errors.iter().any(|e| e.field == v.field) {
                errors.push(v);
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if self
            .store
            .find_by_email(&record.email_id, false)
            .await?
            .is_some()
        {
            debug!(email = %record.email_id, "email taken (pre-check)");
            return Err(AppError::DuplicateEmail);
        }

        self.save(&mut record).await?;
        Ok(record)
    }

    /// Re-validates and writes the record. The password is hashed only when it was
    /// assigned since load.
    pub async fn save(&self, record: &mut UserRecord) -> Result<(), AppError> {
        record.validate()?;

        let new_hash = match record.pending_password() {
            Some(plain) if record.password_changed() => {
                Some(self.hasher.hash_blocking(plain.to_string()).await?)
            }
            _ => None,
        };

        if record.is_persisted() {
            record.updated_at = OffsetDateTime::now_utc();
            self.store.update(record, new_hash.as_deref()).await?;
        } else {
            let hash = new_hash
                .as_deref()
                .ok_or_else(|| AppError::Internal("new record without password".into()))?;
            if let Err(e) = self.store.insert(record, hash).await {
                warn!(email = %record.email_id, error = %e, "insert rejected by store");
                return Err(e.into());
            }
        }

        record.mark_saved(new_hash);
        debug!(user_id = %record.id, "user saved");
        Ok(())
    }

    /// False when the record was loaded without its hash or the hash is corrupt.
    pub async fn compare_password(&self, record: &UserRecord, candidate: &str) -> bool {
        self.hasher
            .verify_blocking(
                candidate.to_string(),
                record.password_hash().map(str::to_string),
            )
            .await
    }

    /// Runs a throwaway verification so a missing account costs as much as a wrong password.
    pub async fn burn_verification(&self, candidate: &str) {
        let _ = self
            .hasher
            .verify_blocking(candidate.to_string(), None)
            .await;
    }

    pub fn issue_token(&self, record: &UserRecord, ttl: Duration) -> Result<String, AppError> {
        self.keys.issue(record.id, ttl)
    }

    pub async fn find_by_email(
        &self,
        email_id: &str,
        include_password: bool,
    ) -> Result<Option<UserRecord>, AppError> {
        Ok(self
            .store
            .find_by_email(&normalize_email(email_id), include_password)
            .await?)
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        include_password: bool,
    ) -> Result<Option<UserRecord>, AppError> {
        Ok(self.store.find_by_id(id, include_password).await?)
    }
}

#[cfg(test)]
pub(crate) fn test_model() -> (UserModel, Arc<super::memory::MemoryUserStore>) {
    let store = Arc::new(super::memory::MemoryUserStore::new());
    let model = UserModel::new(
        store.clone(),
        crate::auth::password::test_hasher(),
        crate::auth::jwt::test_keys(),
    );
    (model, store)
}
