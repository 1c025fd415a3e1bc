use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::UserStore,
    repo_types::{UserRecord, UserRow},
};
use crate::errors::StoreError;

#[derive(Default)]
struct MemoryInner {
    rows: HashMap<Uuid, UserRow>,
    by_email: HashMap<String, Uuid>,
}

/// Map-backed store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored hash, for inspecting what reached storage.
    pub async fn stored_hash(&self, id: Uuid) -> Option<String> {
        let inner = self.inner.read().await;
        inner.rows.get(&id).and_then(|r| r.password_hash.clone())
    }

    /// Replaces the stored hash as-is, bypassing the model.
    pub async fn overwrite_hash(&self, id: Uuid, hash: &str) {
        let mut inner = self.inner.write().await;
        if let Some(row) = inner.rows.get_mut(&id) {
            row.password_hash = Some(hash.to_string());
        }
    }
}

fn to_row(user: &UserRecord, password_hash: Option<String>) -> UserRow {
    UserRow {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email_id: user.email_id.clone(),
        password_hash,
        age: user.age,
        gender: user.gender.as_str().to_string(),
        skills: user.skills.clone(),
        about: user.about.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(
        &self,
        email_id: &str,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email_id)
            .and_then(|id| inner.rows.get(id))
            .map(|r| r.clone().into_record(include_password)))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .get(&id)
            .map(|r| r.clone().into_record(include_password)))
    }

    async fn insert(&self, user: &UserRecord, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&user.email_id) {
            return Err(StoreError::DuplicateEmail);
        }
        if inner.rows.contains_key(&user.id) {
            return Err(StoreError::Other(anyhow::anyhow!("duplicate id {}", user.id)));
        }
        inner.by_email.insert(user.email_id.clone(), user.id);
        inner
            .rows
            .insert(user.id, to_row(user, Some(password_hash.to_string())));
        Ok(())
    }

    async fn update(
        &self,
        user: &UserRecord,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.rows.get(&user.id) else {
            return Err(StoreError::Other(anyhow::anyhow!("user {} not found", user.id)));
        };
        let old_email = existing.email_id.clone();
        let hash = password_hash
            .map(str::to_string)
            .or_else(|| existing.password_hash.clone());

        if old_email != user.email_id {
            if inner.by_email.contains_key(&user.email_id) {
                return Err(StoreError::DuplicateEmail);
            }
            inner.by_email.remove(&old_email);
            inner.by_email.insert(user.email_id.clone(), user.id);
        }
        inner.rows.insert(user.id, to_row(user, hash));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::NewUser;

    fn record(email: &str) -> UserRecord {
        UserRecord::from_new(NewUser {
            first_name: Some("Ann".into()),
            last_name: Some("Lee".into()),
            email_id: Some(email.into()),
            password: Some("Str0ng!pw".into()),
            ..Default::default()
        })
        .0
    }

    #[tokio::test]
    async fn insert_then_find_respects_password_projection() {
        let store = MemoryUserStore::new();
        let user = record("ann@x.com");
        store.insert(&user, "hash-1").await.unwrap();

        let plain = store.find_by_email("ann@x.com", false).await.unwrap().unwrap();
        assert_eq!(plain.id, user.id);
        assert!(plain.password_hash().is_none());

        let with = store.find_by_id(user.id, true).await.unwrap().unwrap();
        assert_eq!(with.password_hash(), Some("hash-1"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.insert(&record("ann@x.com"), "h").await.unwrap();
        let err = store.insert(&record("ann@x.com"), "h").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_without_hash_keeps_stored_hash() {
        let store = MemoryUserStore::new();
        let mut user = record("ann@x.com");
        store.insert(&user, "hash-1").await.unwrap();

        user.age = Some(31);
        store.update(&user, None).await.unwrap();
        assert_eq!(store.stored_hash(user.id).await.as_deref(), Some("hash-1"));

        store.update(&user, Some("hash-2")).await.unwrap();
        assert_eq!(store.stored_hash(user.id).await.as_deref(), Some("hash-2"));
        let found = store.find_by_id(user.id, false).await.unwrap().unwrap();
        assert_eq!(found.age, Some(31));
    }

    #[tokio::test]
    async fn update_to_taken_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.insert(&record("ann@x.com"), "h").await.unwrap();
        let mut bob = record("bob@x.com");
        store.insert(&bob, "h").await.unwrap();

        bob.email_id = "ann@x.com".into();
        let err = store.update(&bob, None).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_of_unknown_user_fails() {
        let store = MemoryUserStore::new();
        assert!(store.update(&record("ann@x.com"), None).await.is_err());
    }
}
