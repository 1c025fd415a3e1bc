use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::services::authenticate;
use crate::{api_error::ApiError, state::AppState, users::repo_types::UserRecord};

/// Reads the session token from the named cookie, falling back to a bearer header.
///
/// A cookie value wrapped in double quotes is read without them.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| unquote(value.trim()))
        .find(|value| !value.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|auth| {
                auth.strip_prefix("Bearer ")
                    .or_else(|| auth.strip_prefix("bearer "))
            })
            .map(|t| t.trim().to_string())
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// The user behind the request's session, resolved by the authentication gate.
pub struct CurrentUser(pub UserRecord);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.cookie.name);
        let user = authenticate(&state.users, token.as_deref()).await?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi; lang=en"),
        );
        assert_eq!(session_token(&headers, "token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(session_token(&headers, "session"), None);
    }

    #[test]
    fn empty_cookie_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(session_token(&headers, "token"), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("token=\"\""));
        assert_eq!(session_token(&headers, "token"), None);
    }

    #[test]
    fn quoted_cookie_value_is_unwrapped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=\"abc.def\"; x=1"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("abc.def"));
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("xtoken=nope; token =yes"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("yes"));
    }

    #[test]
    fn bearer_header_is_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("xyz"));

        headers.insert(header::COOKIE, HeaderValue::from_static("token=from-cookie"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("from-cookie"));
    }
}
