use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    users::{
        repo_types::{NewUser, UserRecord},
        services::UserModel,
    },
};

#[derive(Debug, Clone)]
pub struct Registered {
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub ttl: Duration,
}

/// What the transport should do with the client's session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDirective {
    Discard,
}

/// Progress of a request through the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Unauthenticated,
    TokenExtracted,
    TokenVerified,
    UserResolved,
    Authorized,
}

pub async fn register(users: &UserModel, new: NewUser) -> Result<Registered, AppError> {
    let user = users.create(new).await?;
    info!(user_id = %user.id, "user registered");
    Ok(Registered {
        user_id: user.id,
        display_name: user.display_name().to_string(),
    })
}

/// Unknown email and wrong password both come back as `InvalidCredentials`.
pub async fn login(
    users: &UserModel,
    email_id: Option<&str>,
    password: Option<&str>,
) -> Result<LoginOutcome, AppError> {
    let (Some(email_id), Some(password)) = (
        email_id.filter(|e| !e.trim().is_empty()),
        password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::MissingCredentials);
    };

    let Some(user) = users.find_by_email(email_id, true).await? else {
        users.burn_verification(password).await;
        warn!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !users.compare_password(&user, password).await {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let ttl = users.keys().ttl;
    let token = users.issue_token(&user, ttl)?;
    info!(user_id = %user.id, "user logged in");
    Ok(LoginOutcome { token, ttl })
}

/// Resolves the owner of a session token, or says why the request is refused.
pub async fn authenticate(
    users: &UserModel,
    token: Option<&str>,
) -> Result<UserRecord, AppError> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        debug!(stage = ?GateStage::Unauthenticated, "no session token");
        return Err(AppError::Unauthenticated);
    };
    debug!(stage = ?GateStage::TokenExtracted);

    let user_id = users.keys().verify(token).map_err(|reason| {
        warn!(?reason, "session token rejected");
        AppError::InvalidSession(reason)
    })?;
    debug!(stage = ?GateStage::TokenVerified, %user_id);

    let user = users
        .find_by_id(user_id, false)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "session for missing user");
            AppError::UserNotFound
        })?;
    debug!(stage = ?GateStage::UserResolved, %user_id);
    debug!(stage = ?GateStage::Authorized, %user_id);
    Ok(user)
}

/// Sessions are stateless; logging out only tells the client to drop its token.
pub fn logout() -> SessionDirective {
    SessionDirective::Discard
}
