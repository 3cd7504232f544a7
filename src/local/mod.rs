//! Embedded backend on SQLite.
//!
//! Stands in for the hosted service during development and in tests. It keeps
//! the same observable rules: tasks are scoped to the session's user, one-time
//! links are single use and expire, and email delivery is a log line.

pub mod repository;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::backend::{BackendClient, BackendError, OtpOptions, OtpType};
use crate::models::{Credentials, NewTask, Session, Task, TaskStatus, User};

use self::repository::UserRow;

const OTP_TTL_MINUTES: i64 = 60;

pub struct LocalBackend {
    db: SqlitePool,
}

impl LocalBackend {
    pub async fn connect(database_url: &str) -> Result<Self, BackendError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // every in-memory connection is its own database
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, BackendError> {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    async fn open_session(&self, user: UserRow) -> Result<Session, BackendError> {
        let (access_token, refresh_token) = repository::insert_session(&self.db, &user.id).await?;
        Ok(Session {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    async fn session_user(&self, access_token: Option<&str>) -> Result<Option<UserRow>, BackendError> {
        match access_token {
            Some(token) => Ok(repository::find_user_by_access_token(&self.db, token).await?),
            None => Ok(None),
        }
    }

    async fn require_user(&self, access_token: Option<&str>) -> Result<UserRow, BackendError> {
        self.session_user(access_token)
            .await?
            .ok_or_else(|| BackendError::api(401, "new row violates row-level security policy for table \"tasks\""))
    }

    /// Rejects ids that exist but belong to someone else.
    async fn check_owner(&self, id: &str, user: &UserRow) -> Result<bool, BackendError> {
        match repository::find_task(&self.db, id).await? {
            None => Ok(false),
            Some(task) if task.owner != user.id => {
                Err(BackendError::api(403, "permission denied for table tasks"))
            }
            Some(_) => Ok(true),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> BackendError {
    BackendError::api(400, "Invalid login credentials")
}

fn invalid_link() -> BackendError {
    BackendError::api(403, "Email link is invalid or has expired")
}

fn token_type_matches(requested: OtpType, stored: &str) -> bool {
    match requested {
        OtpType::Email => stored == OtpType::Magiclink.as_str() || stored == OtpType::Signup.as_str(),
        other => other.as_str() == stored,
    }
}

#[async_trait]
impl BackendClient for LocalBackend {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        let email = normalize_email(&credentials.email);
        let user = repository::find_user_by_email(&self.db, &email)
            .await?
            .ok_or_else(invalid_credentials)?;
        let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

        let password = credentials.password.clone();
        let verified = tokio::task::spawn_blocking(move || {
            password_auth::verify_password(password, &hash).is_ok()
        })
        .await?;

        if !verified {
            return Err(invalid_credentials());
        }

        self.open_session(user).await
    }

    async fn sign_up(&self, credentials: &Credentials, email_redirect_to: &str) -> Result<User, BackendError> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() {
            return Err(BackendError::api(400, "Anonymous sign-ins are disabled"));
        }
        if credentials.password.len() < 6 {
            return Err(BackendError::api(422, "Password should be at least 6 characters."));
        }
        if repository::find_user_by_email(&self.db, &email).await?.is_some() {
            return Err(BackendError::api(422, "User already registered"));
        }

        let password = credentials.password.clone();
        let hash = tokio::task::spawn_blocking(move || password_auth::generate_hash(password)).await?;
        let user = repository::insert_user(&self.db, &email, Some(&hash)).await?;

        let token_hash =
            repository::insert_one_time_token(&self.db, &user.id, OtpType::Signup.as_str()).await?;
        info!(
            "confirmation link for {}: {}?token_hash={}&type=signup",
            email, email_redirect_to, token_hash
        );

        Ok(user.into())
    }

    async fn sign_in_with_otp(&self, email: &str, options: &OtpOptions) -> Result<(), BackendError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(BackendError::api(400, "Email is required"));
        }

        let (user, token_type) = match repository::find_user_by_email(&self.db, &email).await? {
            Some(user) => (user, OtpType::Magiclink),
            None if options.should_create_user => {
                (repository::insert_user(&self.db, &email, None).await?, OtpType::Signup)
            }
            None => return Err(BackendError::api(422, "Signups not allowed for otp")),
        };

        let token_hash =
            repository::insert_one_time_token(&self.db, &user.id, token_type.as_str()).await?;
        info!(
            "magic link for {}: {}?token_hash={}&type={}",
            email, options.email_redirect_to, token_hash, token_type
        );

        Ok(())
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<Session, BackendError> {
        let token = repository::find_one_time_token(&self.db, token_hash)
            .await?
            .ok_or_else(invalid_link)?;

        let expired = Utc::now() - token.created_at > Duration::minutes(OTP_TTL_MINUTES);
        if token.consumed_at.is_some() || expired || !token_type_matches(otp_type, &token.token_type) {
            return Err(invalid_link());
        }
        if !repository::consume_one_time_token(&self.db, token_hash).await? {
            return Err(invalid_link());
        }

        let user = repository::find_user_by_id(&self.db, &token.user_id)
            .await?
            .ok_or_else(invalid_link)?;

        self.open_session(user).await
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        Ok(self.session_user(Some(access_token)).await?.map(User::from))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        repository::delete_session(&self.db, access_token).await?;
        Ok(())
    }

    async fn select_tasks(&self, access_token: Option<&str>) -> Result<Vec<Task>, BackendError> {
        match self.session_user(access_token).await? {
            Some(user) => Ok(repository::fetch_tasks(&self.db, &user.id).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn insert_task(&self, access_token: Option<&str>, task: &NewTask) -> Result<Task, BackendError> {
        let user = self.require_user(access_token).await?;
        Ok(repository::insert_task(&self.db, &user.id, &task.title).await?)
    }

    async fn update_task_status(
        &self,
        access_token: Option<&str>,
        id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, BackendError> {
        let user = self.require_user(access_token).await?;
        if !self.check_owner(id, &user).await? {
            return Ok(Vec::new());
        }

        let updated = repository::update_task_status(&self.db, id, &user.id, status).await?;
        Ok(updated.into_iter().collect())
    }

    async fn delete_task(&self, access_token: Option<&str>, id: &str) -> Result<Vec<Task>, BackendError> {
        let user = self.require_user(access_token).await?;
        if !self.check_owner(id, &user).await? {
            return Ok(Vec::new());
        }

        let deleted = repository::delete_task(&self.db, id, &user.id).await?;
        Ok(deleted.into_iter().collect())
    }
}
