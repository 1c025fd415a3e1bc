use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::validate;
use crate::errors::{AppError, FieldError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "non-binary" => Some(Gender::NonBinary),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Password slot of a loaded record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PasswordState {
    /// Loaded without the credential.
    NotLoaded,
    /// Hash as it sits in the store.
    Stored(String),
    /// Plaintext assigned since load; hashed once on the next save.
    Changed(String),
}

/// Fields accepted at registration, kept as raw JSON so that a value of the
/// wrong type is reported as a field violation instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub email_id: Option<Value>,
    pub password: Option<Value>,
    pub age: Option<Value>,
    pub gender: Option<Value>,
    pub skills: Option<Value>,
    pub about: Option<Value>,
}

/// A user document as held in memory between load and save.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub skills: Vec<String>,
    pub about: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    password: PasswordState,
    persisted: bool,
}

fn reported<T: Default>(errors: &mut Vec<FieldError>, parsed: Result<T, FieldError>) -> T {
    parsed.unwrap_or_else(|e| {
        errors.push(e);
        T::default()
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserRecord {
    /// Builds an unsaved record; the plaintext password is marked changed.
    ///
    /// Values that cannot be coerced into the record's types are returned as
    /// violations alongside a record carrying the defaults.
    pub fn from_new(new: NewUser) -> (Self, Vec<FieldError>) {
        let now = OffsetDateTime::now_utc();
        let mut errors = Vec::new();

        let mut text = |field: &'static str, value: Option<&Value>| {
            reported(&mut errors, validate::parse_text(field, value))
        };
        let first_name = text("firstName", new.first_name.as_ref());
        let last_name = text("lastName", new.last_name.as_ref());
        let email_id = text("emailId", new.email_id.as_ref());
        let password = text("password", new.password.as_ref());
        let about = text("about", new.about.as_ref());

        let age = match &new.age {
            Some(v) => reported(&mut errors, validate::parse_age(v)),
            None => None,
        };
        let gender = match &new.gender {
            None | Some(Value::Null) => Gender::default(),
            Some(v) => reported(&mut errors, validate::parse_gender_value(v)),
        };
        let skills = reported(&mut errors, validate::parse_skills(new.skills.as_ref()));

        let record = Self {
            id: Uuid::new_v4(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email_id: normalize_email(&email_id),
            age,
            gender,
            skills,
            about,
            created_at: now,
            updated_at: now,
            password: PasswordState::Changed(password),
            persisted: false,
        };
        (record, errors)
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn password_changed(&self) -> bool {
        matches!(self.password, PasswordState::Changed(_))
    }

    /// Stored hash, present only when the record was loaded with it.
    pub fn password_hash(&self) -> Option<&str> {
        match &self.password {
            PasswordState::Stored(h) => Some(h),
            _ => None,
        }
    }

    pub(crate) fn pending_password(&self) -> Option<&str> {
        match &self.password {
            PasswordState::Changed(p) => Some(p),
            _ => None,
        }
    }

    /// Assigns a new plaintext password; it is hashed on the next save.
    pub fn set_password(&mut self, plain: impl Into<String>) {
        self.password = PasswordState::Changed(plain.into());
    }

    pub(crate) fn mark_saved(&mut self, new_hash: Option<String>) {
        if let Some(hash) = new_hash {
            self.password = PasswordState::Stored(hash);
        }
        self.persisted = true;
    }

    /// Checks every field constraint and reports all violations at once.
    pub fn validate(&self) -> Result<(), AppError> {
        let errors = self.collect_violations();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    pub(crate) fn collect_violations(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = [
            validate::check_name("firstName", &self.first_name),
            validate::check_name("lastName", &self.last_name),
            validate::check_email(&self.email_id),
            validate::check_age(self.age.map(i64::from)),
            validate::check_skills(&self.skills),
            validate::check_about(&self.about),
        ]
        .into_iter()
        .flatten()
        .collect();

        if let Some(plain) = self.pending_password() {
            errors.extend(validate::check_password(plain));
        }
        errors
    }

    pub fn display_name(&self) -> &str {
        &self.first_name
    }
}

/// Row shape of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
    pub gender: String,
    pub skills: Vec<String>,
    pub about: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserRow {
    /// Rebuilds a record; the hash is kept only when `include_password` is set.
    pub fn into_record(self, include_password: bool) -> UserRecord {
        let password = match self.password_hash {
            Some(h) if include_password => PasswordState::Stored(h),
            _ => PasswordState::NotLoaded,
        };
        UserRecord {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email_id: self.email_id,
            age: self.age,
            gender: Gender::parse(&self.gender).unwrap_or_default(),
            skills: self.skills,
            about: self.about,
            created_at: self.created_at,
            updated_at: self.updated_at,
            password,
            persisted: true,
        }
    }
}

/// Client-facing projection; never carries the password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub skills: Vec<String>,
    pub about: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&UserRecord> for PublicProfile {
    fn from(r: &UserRecord) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            email_id: r.email_id.clone(),
            age: r.age,
            gender: r.gender,
            skills: r.skills.clone(),
            about: r.about.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
