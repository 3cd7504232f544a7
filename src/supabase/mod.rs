pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::backend::{BackendClient, BackendError, OtpOptions, OtpType};
use crate::models::{Credentials, NewTask, Session, Task, TaskStatus, User};

const TASKS_TABLE: &str = "tasks";

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }
}

/// Client for the hosted auth (GoTrue) and REST (PostgREST) APIs.
pub struct SupabaseClient {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn auth_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        self.url(&format!("{}/auth/v1/{}", self.config.url, path), params)
    }

    pub fn rest_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        self.url(&format!("{}/rest/v1/{}", self.config.url, table), params)
    }

    fn url(&self, base: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        let parsed = if params.is_empty() {
            Url::parse(base)
        } else {
            Url::parse_with_params(base, params)
        };
        parsed.map_err(|e| BackendError::api(500, format!("Invalid backend url {}: {}", base, e)))
    }

    /// Anonymous calls authenticate with the anon key itself.
    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token.unwrap_or(self.config.anon_key.as_str()))
    }

    fn table_request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        self.request(method, url, access_token)
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        Ok(())
    }
}

pub fn error_from_body(status: u16, body: &str) -> BackendError {
    let message = serde_json::from_str::<dto::ErrorBody>(body)
        .ok()
        .and_then(dto::ErrorBody::into_message)
        .unwrap_or_else(|| format!("Backend responded with status {}", status));

    BackendError::api(status, message)
}

#[async_trait]
impl BackendClient for SupabaseClient {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        let url = self.auth_url("token", &[("grant_type", "password")])?;
        let response: dto::SessionResponse = self
            .send(self.request(Method::POST, url, None).json(credentials))
            .await?;

        response
            .into_session()
            .ok_or_else(|| BackendError::api(500, "Sign in returned no user"))
    }

    async fn sign_up(&self, credentials: &Credentials, email_redirect_to: &str) -> Result<User, BackendError> {
        let url = self.auth_url("signup", &[("redirect_to", email_redirect_to)])?;
        let response: dto::SignUpResponse = self
            .send(self.request(Method::POST, url, None).json(credentials))
            .await?;

        match response {
            dto::SignUpResponse::User(user) => Ok(user),
            dto::SignUpResponse::Session(session) => session
                .user
                .ok_or_else(|| BackendError::api(500, "Sign up returned no user")),
        }
    }

    async fn sign_in_with_otp(&self, email: &str, options: &OtpOptions) -> Result<(), BackendError> {
        let url = self.auth_url("otp", &[("redirect_to", options.email_redirect_to.as_str())])?;
        let body = dto::OtpRequest {
            email,
            create_user: options.should_create_user,
        };

        self.send_empty(self.request(Method::POST, url, None).json(&body))
            .await
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<Session, BackendError> {
        let url = self.auth_url("verify", &[])?;
        let body = dto::VerifyRequest {
            otp_type: otp_type.as_str(),
            token_hash,
        };
        let response: dto::SessionResponse = self
            .send(self.request(Method::POST, url, None).json(&body))
            .await?;

        response
            .into_session()
            .ok_or_else(|| BackendError::api(401, "Authentication failed"))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        let url = self.auth_url("user", &[])?;
        match self
            .send::<User>(self.request(Method::GET, url, Some(access_token)))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(BackendError::Api { status: 401 | 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.auth_url("logout", &[("scope", "local")])?;
        self.send_empty(self.request(Method::POST, url, Some(access_token)))
            .await
    }

    async fn select_tasks(&self, access_token: Option<&str>) -> Result<Vec<Task>, BackendError> {
        let url = self.rest_url(TASKS_TABLE, &[("select", "*"), ("order", "created_at.desc")])?;
        self.send(self.request(Method::GET, url, access_token)).await
    }

    async fn insert_task(&self, access_token: Option<&str>, task: &NewTask) -> Result<Task, BackendError> {
        let url = self.rest_url(TASKS_TABLE, &[])?;
        let rows: Vec<Task> = self
            .send(self.table_request(Method::POST, url, access_token).json(task))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::api(500, "Insert returned no rows"))
    }

    async fn update_task_status(
        &self,
        access_token: Option<&str>,
        id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, BackendError> {
        let filter = format!("eq.{}", id);
        let url = self.rest_url(TASKS_TABLE, &[("id", filter.as_str())])?;
        let body = dto::StatusUpdate { status };

        self.send(self.table_request(Method::PATCH, url, access_token).json(&body))
            .await
    }

    async fn delete_task(&self, access_token: Option<&str>, id: &str) -> Result<Vec<Task>, BackendError> {
        let filter = format!("eq.{}", id);
        let url = self.rest_url(TASKS_TABLE, &[("id", filter.as_str())])?;

        self.send(self.table_request(Method::DELETE, url, access_token))
            .await
    }
}
