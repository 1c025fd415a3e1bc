use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{
    dto::{PasswordChangeRequest, ProfileUpdatedResponse},
    services::{change_password, edit_profile},
};
use crate::{
    api_error::{ApiError, JsonBody},
    auth::{extractors::CurrentUser, MessageResponse},
    state::AppState,
    users::repo_types::PublicProfile,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(view_profile))
        .route("/profile/edit", patch(edit))
        .route("/profile/edit-password", patch(edit_password))
}

#[instrument(skip_all)]
pub async fn view_profile(CurrentUser(user): CurrentUser) -> Json<PublicProfile> {
    Json(PublicProfile::from(&user))
}

#[instrument(skip_all)]
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<Json<ProfileUpdatedResponse>, ApiError> {
    let updated = edit_profile(&state.users, &user, &payload).await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully".into(),
        profile: PublicProfile::from(&updated),
    }))
}

#[instrument(skip_all)]
pub async fn edit_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<PasswordChangeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    change_password(
        &state.users,
        &user,
        payload.old_password(),
        payload.new_password(),
    )
    .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
