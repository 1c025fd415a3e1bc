use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    errors::{AppError, FieldError},
    users::{
        repo_types::UserRecord,
        services::UserModel,
        validate::{is_strong_password, parse_age, parse_gender_value, parse_name},
    },
};

/// Fields a client may change through the bulk edit.
pub const EDITABLE_FIELDS: [&str; 4] = ["firstName", "lastName", "age", "gender"];

/// Applies a whitelisted set of field changes to the caller's record.
///
/// Any key outside [`EDITABLE_FIELDS`] rejects the whole request before anything
/// is applied. Edits are made on a freshly loaded copy, so a failed validation
/// leaves the stored record untouched and fields changed by an earlier request
/// are not written back with the values `current` was loaded with.
pub async fn edit_profile(
    users: &UserModel,
    current: &UserRecord,
    fields: &Map<String, Value>,
) -> Result<UserRecord, AppError> {
    let forbidden: Vec<String> = fields
        .keys()
        .filter(|k| !EDITABLE_FIELDS.contains(&k.as_str()))
        .cloned()
        .collect();
    if !forbidden.is_empty() {
        warn!(user_id = %current.id, ?forbidden, "edit with forbidden fields");
        return Err(AppError::ForbiddenField(forbidden));
    }
    if fields.is_empty() {
        return Ok(current.clone());
    }

    let mut draft = users
        .find_by_id(current.id, false)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let mut errors: Vec<FieldError> = Vec::new();
    for (key, value) in fields {
        let applied = match key.as_str() {
            "firstName" => parse_name("firstName", value).map(|v| draft.first_name = v),
            "lastName" => parse_name("lastName", value).map(|v| draft.last_name = v),
            "age" => parse_age(value).map(|v| draft.age = v),
            "gender" => parse_gender_value(value).map(|v| draft.gender = v),
            _ => Ok(()),
        };
        if let Err(e) = applied {
            errors.push(e);
        }
    }

    if !errors.is_empty() {
        for v in draft.collect_violations() {
            if !errors.iter().any(|e| e.field == v.field) {
                errors.push(v);
            }
        }
        return Err(AppError::Validation(errors));
    }

    users.save(&mut draft).await?;
    info!(user_id = %draft.id, fields = ?fields.keys().collect::<Vec<_>>(), "profile updated");
    Ok(draft)
}

/// Replaces the password after proving knowledge of the current one.
pub async fn change_password(
    users: &UserModel,
    current: &UserRecord,
    old_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<(), AppError> {
    let (Some(old_password), Some(new_password)) = (
        old_password.filter(|p| !p.is_empty()),
        new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::MissingFields);
    };

    if !is_strong_password(new_password) {
        return Err(AppError::WeakPassword);
    }

    // The request-context record is loaded without the hash.
    let mut fresh = users
        .find_by_id(current.id, true)
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !users.compare_password(&fresh, old_password).await {
        warn!(user_id = %fresh.id, "password change with wrong old password");
        return Err(AppError::WrongPassword);
    }

    fresh.set_password(new_password);
    users.save(&mut fresh).await?;
    info!(user_id = %fresh.id, "password changed");
    Ok(())
}
