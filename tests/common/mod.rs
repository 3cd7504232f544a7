//! Shared fixtures for the integration tests.
//!
//! Each test file is its own crate, so helpers used by only some of them
//! would otherwise trip dead code warnings.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::Utc;
use http_body_util::BodyExt;

use taskboard::backend::{BackendClient, BackendError, OtpOptions, OtpType, SessionClient};
use taskboard::config::AppConfig;
use taskboard::models::{Credentials, NewTask, Session, Task, TaskStatus, User};
use taskboard::state::AppState;

pub const ACCESS_TOKEN: &str = "token-1";
pub const PASSWORD: &str = "secret-password";
pub const VALID_TOKEN_HASH: &str = "T";

pub fn user() -> User {
    User {
        id: "user-1".to_string(),
        email: Some("ada@example.com".to_string()),
    }
}

pub fn session() -> Session {
    Session {
        access_token: ACCESS_TOKEN.to_string(),
        refresh_token: "refresh-1".to_string(),
        user: user(),
    }
}

pub fn task(id: &str, title: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        status,
        created_at: Utc::now(),
        owner: user().id,
    }
}

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<String>>,
    tasks: Mutex<Vec<Task>>,
    reject: Option<(u16, &'static str)>,
    unavailable: bool,
    last_otp: Mutex<Option<(String, OtpOptions)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    /// Every call is refused with this status and message.
    pub fn rejecting(status: u16, message: &'static str) -> Self {
        Self {
            reject: Some((status, message)),
            ..Self::default()
        }
    }

    /// Every call fails below the service, as a dropped connection would.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c == name)
    }

    pub fn stored_tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn last_otp(&self) -> Option<(String, OtpOptions)> {
        self.last_otp.lock().unwrap().clone()
    }

    fn record(&self, name: &str) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.unavailable {
            return Err(BackendError::Database(sqlx::Error::PoolTimedOut));
        }
        match self.reject {
            Some((status, message)) => Err(BackendError::api(status, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        self.record("sign_in_with_password")?;
        if credentials.email == "ada@example.com" && credentials.password == PASSWORD {
            Ok(session())
        } else {
            Err(BackendError::api(400, "Invalid login credentials"))
        }
    }

    async fn sign_up(&self, credentials: &Credentials, _email_redirect_to: &str) -> Result<User, BackendError> {
        self.record("sign_up")?;
        Ok(User {
            id: "user-2".to_string(),
            email: Some(credentials.email.clone()),
        })
    }

    async fn sign_in_with_otp(&self, email: &str, options: &OtpOptions) -> Result<(), BackendError> {
        self.record("sign_in_with_otp")?;
        *self.last_otp.lock().unwrap() = Some((email.to_string(), options.clone()));
        Ok(())
    }

    async fn verify_otp(&self, token_hash: &str, _otp_type: OtpType) -> Result<Session, BackendError> {
        self.record("verify_otp")?;
        if token_hash == VALID_TOKEN_HASH {
            Ok(session())
        } else {
            Err(BackendError::api(403, "Email link is invalid or has expired"))
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        self.record("get_user")?;
        Ok((access_token == ACCESS_TOKEN).then(user))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        self.record("sign_out")
    }

    async fn select_tasks(&self, _access_token: Option<&str>) -> Result<Vec<Task>, BackendError> {
        self.record("select_tasks")?;
        Ok(self.stored_tasks())
    }

    async fn insert_task(&self, _access_token: Option<&str>, new_task: &NewTask) -> Result<Task, BackendError> {
        self.record("insert_task")?;
        let mut tasks = self.tasks.lock().unwrap();
        let created = task(&format!("srv-{}", tasks.len() + 1), &new_task.title, TaskStatus::Todo);
        tasks.insert(0, created.clone());
        Ok(created)
    }

    async fn update_task_status(
        &self,
        _access_token: Option<&str>,
        id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, BackendError> {
        self.record("update_task_status")?;
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter_mut()
            .filter(|t| t.id == id)
            .map(|t| {
                t.status = status;
                t.clone()
            })
            .collect())
    }

    async fn delete_task(&self, _access_token: Option<&str>, id: &str) -> Result<Vec<Task>, BackendError> {
        self.record("delete_task")?;
        let mut tasks = self.tasks.lock().unwrap();
        let (removed, kept): (Vec<Task>, Vec<Task>) = tasks.drain(..).partition(|t| t.id == id);
        *tasks = kept;
        Ok(removed)
    }
}

pub fn signed_in(backend: &Arc<MockBackend>) -> SessionClient {
    SessionClient::new(backend.clone(), Some(ACCESS_TOKEN.to_string()))
}

pub fn anonymous(backend: &Arc<MockBackend>) -> SessionClient {
    SessionClient::anonymous(backend.clone())
}

pub fn app_state(backend: Arc<MockBackend>) -> AppState {
    AppState::new(backend, AppConfig::default())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_session(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("cookie", format!("sb-access-token={}", ACCESS_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str, with_session: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if with_session {
        builder = builder.header("cookie", format!("sb-access-token={}", ACCESS_TOKEN));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
