use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use crate::errors::AppError;

/// Transport wrapper that turns a domain error kind into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

/// `Json` extractor whose rejection is reported as [`AppError::InvalidInput`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(%rejection, "request body rejected");
                Err(ApiError(AppError::InvalidInput(rejection.body_text())))
            }
        }
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_)
        | AppError::MissingCredentials
        | AppError::MissingFields
        | AppError::WeakPassword
        | AppError::WrongPassword
        | AppError::ForbiddenField(_)
        | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::InvalidCredentials
        | AppError::Unauthenticated
        | AppError::InvalidSession(_)
        | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
        AppError::DuplicateEmail => StatusCode::CONFLICT,
        AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(&err);
        let body = match &err {
            AppError::Store(_) | AppError::Internal(_) => {
                error!(error = %err, "request failed");
                json!({ "error": err.kind(), "message": "Internal Server Error" })
            }
            AppError::Validation(fields) => {
                json!({ "error": err.kind(), "message": err.to_string(), "fields": fields })
            }
            AppError::ForbiddenField(fields) => {
                json!({ "error": err.kind(), "message": err.to_string(), "fields": fields })
            }
            // Session failures all read the same to the client.
            AppError::Unauthenticated | AppError::InvalidSession(_) | AppError::UserNotFound => {
                json!({ "error": err.kind(), "message": "Please login" })
            }
            _ => json!({ "error": err.kind(), "message": err.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
