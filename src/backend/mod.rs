//! Contract with the hosted auth + database service.
//!
//! Everything durable lives behind [`BackendClient`]. Handlers never talk to
//! an implementation directly; they receive a [`SessionClient`] built for the
//! current request from the shared handle and the caller's cookies.

pub mod session;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Credentials, NewTask, Session, Task, TaskStatus, User};

pub use session::{SessionClient, clear_session, set_session};

pub const SERVICE_UNAVAILABLE: &str = "Authentication service is unavailable";

#[derive(Debug, Error)]
pub enum BackendError {
    /// The service answered and refused the call.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackendError::Api {
            status,
            message: message.into(),
        }
    }

    /// Text safe to put in front of the user. Only the service's own refusals
    /// are passed through.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } => message.clone(),
            _ => SERVICE_UNAVAILABLE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Signup,
    Invite,
    Magiclink,
    Recovery,
    EmailChange,
    Email,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::Signup => "signup",
            OtpType::Invite => "invite",
            OtpType::Magiclink => "magiclink",
            OtpType::Recovery => "recovery",
            OtpType::EmailChange => "email_change",
            OtpType::Email => "email",
        }
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(OtpType::Signup),
            "invite" => Ok(OtpType::Invite),
            "magiclink" => Ok(OtpType::Magiclink),
            "recovery" => Ok(OtpType::Recovery),
            "email_change" => Ok(OtpType::EmailChange),
            "email" => Ok(OtpType::Email),
            other => Err(format!("unknown otp type: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpOptions {
    pub should_create_user: bool,
    pub email_redirect_to: String,
}

/// Operations the application needs from the backend.
///
/// Table operations take the caller's access token; the backend decides
/// which rows that token may see or change. `None` means an anonymous caller.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError>;
    async fn sign_up(&self, credentials: &Credentials, email_redirect_to: &str) -> Result<User, BackendError>;
    async fn sign_in_with_otp(&self, email: &str, options: &OtpOptions) -> Result<(), BackendError>;
    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<Session, BackendError>;
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn select_tasks(&self, access_token: Option<&str>) -> Result<Vec<Task>, BackendError>;
    async fn insert_task(&self, access_token: Option<&str>, task: &NewTask) -> Result<Task, BackendError>;
    /// Returns the rows that were changed.
    async fn update_task_status(
        &self,
        access_token: Option<&str>,
        id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, BackendError>;
    /// Returns the rows that were removed.
    async fn delete_task(&self, access_token: Option<&str>, id: &str) -> Result<Vec<Task>, BackendError>;
}
