use serde::Deserialize;
use tracing::{error, info};

use crate::actions::auth::{AuthRedirect, login_error};
use crate::backend::{OtpType, SessionClient};

pub const INVALID_LINK: &str = "Invalid authentication link";
pub const AUTH_FAILED: &str = "Authentication failed";

/// Query string of the link sent by email.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfirmParams {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub otp_type: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Providers sometimes encode the description twice.
fn decode_description(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Only same-site paths are followed; anything else lands on `/`.
fn redirect_target(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// An error reported by the provider wins over any token in the link.
pub async fn confirm(client: &SessionClient, params: &ConfirmParams) -> AuthRedirect {
    if let Some(error_param) = present(&params.error) {
        let description = present(&params.error_description).map(decode_description);
        error!(
            "auth confirmation error: {} {}",
            error_param,
            description.as_deref().unwrap_or("")
        );
        return AuthRedirect::to(login_error(description.as_deref().unwrap_or(AUTH_FAILED)));
    }

    if let (Some(token_hash), Some(otp_type)) = (present(&params.token_hash), present(&params.otp_type)) {
        let otp_type = match otp_type.parse::<OtpType>() {
            Ok(t) => t,
            Err(e) => {
                error!("auth confirmation failed: {}", e);
                return AuthRedirect::to(login_error(INVALID_LINK));
            }
        };

        return match client.verify_otp(token_hash, otp_type).await {
            Ok(session) => {
                info!(
                    "magic link verification successful for user: {}",
                    session.user.email.as_deref().unwrap_or(&session.user.id)
                );
                AuthRedirect::signed_in(redirect_target(present(&params.next)), session)
            }
            Err(e) => {
                error!("otp verification failed: {}", e);
                AuthRedirect::to(login_error(&e.user_message()))
            }
        };
    }

    error!("auth confirmation failed - missing token_hash or type");
    AuthRedirect::to(login_error(INVALID_LINK))
}
