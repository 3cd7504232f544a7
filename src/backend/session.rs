use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::backend::{BackendClient, BackendError, OtpOptions, OtpType};
use crate::models::{Credentials, NewTask, Session, Task, TaskStatus, User};
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Backend handle scoped to one request and the session found in its cookies.
#[derive(Clone)]
pub struct SessionClient {
    backend: Arc<dyn BackendClient>,
    access_token: Option<String>,
}

impl SessionClient {
    pub fn new(backend: Arc<dyn BackendClient>, access_token: Option<String>) -> Self {
        Self {
            backend,
            access_token,
        }
    }

    pub fn anonymous(backend: Arc<dyn BackendClient>) -> Self {
        Self::new(backend, None)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        self.backend.sign_in_with_password(credentials).await
    }

    pub async fn sign_up(&self, credentials: &Credentials, email_redirect_to: &str) -> Result<User, BackendError> {
        self.backend.sign_up(credentials, email_redirect_to).await
    }

    pub async fn sign_in_with_otp(&self, email: &str, options: &OtpOptions) -> Result<(), BackendError> {
        self.backend.sign_in_with_otp(email, options).await
    }

    pub async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<Session, BackendError> {
        self.backend.verify_otp(token_hash, otp_type).await
    }

    pub async fn get_user(&self) -> Result<Option<User>, BackendError> {
        match self.access_token() {
            Some(token) => self.backend.get_user(token).await,
            None => Ok(None),
        }
    }

    pub async fn sign_out(&self) -> Result<(), BackendError> {
        match self.access_token() {
            Some(token) => self.backend.sign_out(token).await,
            None => Ok(()),
        }
    }

    pub async fn select_tasks(&self) -> Result<Vec<Task>, BackendError> {
        self.backend.select_tasks(self.access_token()).await
    }

    pub async fn insert_task(&self, task: &NewTask) -> Result<Task, BackendError> {
        self.backend.insert_task(self.access_token(), task).await
    }

    pub async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Vec<Task>, BackendError> {
        self.backend.update_task_status(self.access_token(), id, status).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<Vec<Task>, BackendError> {
        self.backend.delete_task(self.access_token(), id).await
    }
}

impl FromRequestParts<AppState> for SessionClient {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        Ok(SessionClient::new(state.backend.clone(), access_token))
    }
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn set_session(jar: CookieJar, session: &Session, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), secure))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone(), secure))
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"))
}
