use serde::{Deserialize, Serialize};

use crate::models::{Session, TaskStatus, User};

/// Body of a token grant or OTP verification.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
}

impl SessionResponse {
    pub fn into_session(self) -> Option<Session> {
        let user = self.user?;
        Some(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user,
        })
    }
}

/// Signup answers with a session when confirmations are off, otherwise with the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(SessionResponse),
    User(User),
}

#[derive(Debug, Serialize)]
pub struct OtpRequest<'a> {
    pub email: &'a str,
    pub create_user: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    pub otp_type: &'a str,
    pub token_hash: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

/// Auth and REST endpoints disagree on error field names.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .filter(|m| !m.is_empty())
    }
}
