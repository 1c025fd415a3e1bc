use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::users::repo_types::PublicProfile;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: Option<Value>,
    pub new_password: Option<Value>,
}

impl PasswordChangeRequest {
    pub fn old_password(&self) -> Option<&str> {
        self.old_password.as_ref().and_then(Value::as_str)
    }

    pub fn new_password(&self) -> Option<&str> {
        self.new_password.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub profile: PublicProfile,
}
