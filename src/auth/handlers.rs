use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{LoginRequest, LoginResponse, MessageResponse, SignupResponse},
    services::{self, SessionDirective},
};
use crate::{
    api_error::{ApiError, JsonBody},
    config::CookieConfig,
    errors::AppError,
    state::AppState,
    users::repo_types::NewUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// `Set-Cookie` value carrying (or clearing, with `max_age == 0`) the session token.
pub fn session_cookie(cfg: &CookieConfig, value: &str, max_age: u64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        cfg.name, value, max_age
    );
    if cfg.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_headers(cookie: String) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("bad cookie header: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let reg = services::register(&state.users, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: reg.user_id,
            message: format!("User {} signed up successfully.", reg.display_name),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let out = services::login(&state.users, payload.email_id(), payload.password()).await?;

    let ttl_secs = out.ttl.as_secs();
    let headers = cookie_headers(session_cookie(&state.config.cookie, &out.token, ttl_secs))?;
    Ok((
        headers,
        Json(LoginResponse {
            message: "Login successful".into(),
            expires_in: ttl_secs,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
) -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let headers = match services::logout() {
        SessionDirective::Discard => cookie_headers(session_cookie(&state.config.cookie, "", 0))?,
    };
    Ok((headers, Json(MessageResponse::new("Logout successful"))))
}
