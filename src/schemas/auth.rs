use serde::{Deserialize, Serialize};

use crate::schemas::user::UserResponse;

/// JSON login payload; the form-posting variant lives in the auth handler.
#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}
