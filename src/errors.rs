use serde::Serialize;
use thiserror::Error;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Why a session token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature or claims invalid")]
    Invalid,
    #[error("token malformed")]
    Malformed,
}

/// Failures reported by a [`crate::users::repo::UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Domain outcome of every account operation.
///
/// The variants name error kinds only; mapping them to a transport status is the
/// routing layer's job (see `api_error.rs`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid session: {0}")]
    InvalidSession(TokenError),

    #[error("user not found")]
    UserNotFound,

    #[error("fields not allowed: {}", .0.join(", "))]
    ForbiddenField(Vec<String>),

    #[error("new password must be at least 8 characters and contain uppercase, lowercase, number and symbol")]
    WeakPassword,

    #[error("old password is incorrect")]
    WrongPassword,

    #[error("both old and new passwords are required")]
    MissingFields,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::DuplicateEmail => "DuplicateEmail",
            AppError::MissingCredentials => "MissingCredentials",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::Unauthenticated => "Unauthenticated",
            AppError::InvalidSession(_) => "InvalidSession",
            AppError::UserNotFound => "UserNotFound",
            AppError::ForbiddenField(_) => "ForbiddenField",
            AppError::WeakPassword => "WeakPassword",
            AppError::WrongPassword => "WrongPassword",
            AppError::MissingFields => "MissingFields",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Store(_) => "StoreError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::Other(e) => AppError::Store(e),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
