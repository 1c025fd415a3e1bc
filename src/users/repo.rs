use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{UserRecord, UserRow};
use crate::errors::StoreError;

/// Persistence contract for user documents.
///
/// Implementations own the uniqueness of `email_id`: a clash on insert or update
/// must come back as [`StoreError::DuplicateEmail`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(
        &self,
        email_id: &str,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(
        &self,
        id: Uuid,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, user: &UserRecord, password_hash: &str) -> Result<(), StoreError>;

    /// Writes profile fields; the password column is touched only when a new hash is given.
    async fn update(
        &self,
        user: &UserRecord,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError>;
}

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_USER: &str = r#"
    SELECT id, first_name, last_name, email_id, password_hash, age, gender,
           skills, about, created_at, updated_at
    FROM users
"#;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Other(anyhow::Error::new(e).context(what))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(
        &self,
        email_id: &str,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email_id = $1"))
            .bind(email_id)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        Ok(row.map(|r| r.into_record(include_password)))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        include_password: bool,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(row.map(|r| r.into_record(include_password)))
    }

    async fn insert(&self, user: &UserRecord, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email_id, password_hash, age, gender,
                               skills, about, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_id)
        .bind(password_hash)
        .bind(user.age)
        .bind(user.gender.as_str())
        .bind(&user.skills)
        .bind(&user.about)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_err(e, "insert user"))?;
        Ok(())
    }

    async fn update(
        &self,
        user: &UserRecord,
        password_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET first_name = $2, last_name = $3, email_id = $4, age = $5, gender = $6,
                   skills = $7, about = $8, updated_at = $9,
                   password_hash = COALESCE($10, password_hash)
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_id)
        .bind(user.age)
        .bind(user.gender.as_str())
        .bind(&user.skills)
        .bind(&user.about)
        .bind(user.updated_at)
        .bind(password_hash)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_err(e, "update user"))?;

        if res.rows_affected() == 0 {
            return Err(StoreError::Other(anyhow::anyhow!("user {} not found", user.id)));
        }
        Ok(())
    }
}
