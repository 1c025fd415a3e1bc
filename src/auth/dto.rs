use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Request body for login. A value that is not a string counts as missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_id: Option<Value>,
    pub password: Option<Value>,
}

impl LoginRequest {
    pub fn email_id(&self) -> Option<&str> {
        self.email_id.as_ref().and_then(Value::as_str)
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().and_then(Value::as_str)
    }
}

/// Response returned after signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub message: String,
}

/// Response returned after login; the token itself travels in the cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
