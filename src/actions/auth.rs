use tracing::{debug, error, info, warn};

use crate::backend::{OtpOptions, SessionClient};
use crate::models::{Credentials, Session};

pub const EMAIL_REQUIRED: &str = "Email is required";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    Keep,
    Set(Session),
    Clear,
}

/// Where to send the browser next, and what to do with its session cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRedirect {
    pub location: String,
    pub session: SessionChange,
}

impl AuthRedirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            session: SessionChange::Keep,
        }
    }

    pub fn signed_in(location: impl Into<String>, session: Session) -> Self {
        Self {
            location: location.into(),
            session: SessionChange::Set(session),
        }
    }

    pub fn signed_out(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            session: SessionChange::Clear,
        }
    }
}

pub fn login_error(message: &str) -> String {
    format!("/login?error={}", urlencoding::encode(message))
}

pub fn register_error(message: &str) -> String {
    format!("/register?error={}", urlencoding::encode(message))
}

pub async fn login(client: &SessionClient, credentials: &Credentials) -> AuthRedirect {
    match client.sign_in_with_password(credentials).await {
        Ok(session) => {
            info!("login succeeded for {}", credentials.email);
            AuthRedirect::signed_in("/", session)
        }
        Err(e) => {
            error!("login error: {}", e);
            AuthRedirect::to(login_error(&e.user_message()))
        }
    }
}

pub async fn send_magic_link(
    client: &SessionClient,
    email: Option<&str>,
    email_redirect_to: &str,
) -> AuthRedirect {
    let Some(email) = email.filter(|e| !e.trim().is_empty()) else {
        return AuthRedirect::to(login_error(EMAIL_REQUIRED));
    };

    debug!("magic link redirect target: {}", email_redirect_to);
    let options = OtpOptions {
        should_create_user: true,
        email_redirect_to: email_redirect_to.to_string(),
    };

    match client.sign_in_with_otp(email, &options).await {
        Ok(()) => {
            info!("magic link sent to {}", email);
            AuthRedirect::to("/login?magic_sent=true")
        }
        Err(e) => {
            error!("magic link error: {}", e);
            AuthRedirect::to(login_error(&e.user_message()))
        }
    }
}

pub async fn signup(
    client: &SessionClient,
    credentials: &Credentials,
    email_redirect_to: &str,
) -> AuthRedirect {
    match client.sign_up(credentials, email_redirect_to).await {
        Ok(user) => {
            info!("signup succeeded for user {}", user.id);
            AuthRedirect::to("/register?success=true")
        }
        Err(e) => {
            error!("signup error: {}", e);
            AuthRedirect::to(register_error(&e.user_message()))
        }
    }
}

/// Cookies are cleared even when the backend could not revoke the session.
pub async fn logout(client: &SessionClient) -> AuthRedirect {
    if let Err(e) = client.sign_out().await {
        warn!("sign out failed: {}", e);
    }
    AuthRedirect::signed_out("/login")
}
