use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::actions::{self, AuthRedirect, ConfirmParams, SessionChange, tasks};
use crate::api;
use crate::backend::{SessionClient, clear_session, set_session};
use crate::error::AppError;
use crate::models::Credentials;
use crate::state::AppState;
use crate::views::{TaskProjection, pages};

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    error: Option<String>,
    magic_sent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RegisterQuery {
    error: Option<String>,
    success: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MagicLinkForm {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskForm {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    #[serde(default)]
    status: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(api::health))
        .route("/auth/confirm", get(confirm))
        .route("/login", get(login_page).post(login))
        .route("/login/magic-link", post(send_magic_link))
        .route("/register", get(register_page).post(signup))
        .route("/logout", post(logout))
        .route("/", get(home))
        .route("/error", get(error_page))
        .route("/tasks", post(create_task))
        .route("/tasks/{id}/status", post(update_task_status))
        .route("/tasks/{id}/delete", post(delete_task))
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pages always reflect the latest backend state.
fn no_store(html: String) -> Response {
    ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response()
}

fn finish(jar: CookieJar, outcome: AuthRedirect, secure: bool) -> (CookieJar, Redirect) {
    let jar = match &outcome.session {
        SessionChange::Keep => jar,
        SessionChange::Set(session) => set_session(jar, session, secure),
        SessionChange::Clear => clear_session(jar),
    };
    (jar, Redirect::to(&outcome.location))
}

async fn confirm(
    State(state): State<AppState>,
    client: SessionClient,
    jar: CookieJar,
    Query(params): Query<ConfirmParams>,
) -> (CookieJar, Redirect) {
    let outcome = actions::confirm::confirm(&client, &params).await;
    finish(jar, outcome, state.config.cookie_secure)
}

async fn login_page(Query(query): Query<LoginQuery>) -> Response {
    let magic_sent = query.magic_sent.as_deref() == Some("true");
    no_store(pages::login_page(query.error.as_deref(), magic_sent))
}

async fn login(
    State(state): State<AppState>,
    client: SessionClient,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> (CookieJar, Redirect) {
    let outcome = actions::auth::login(&client, &credentials).await;
    finish(jar, outcome, state.config.cookie_secure)
}

async fn send_magic_link(
    State(state): State<AppState>,
    client: SessionClient,
    Form(form): Form<MagicLinkForm>,
) -> Redirect {
    let outcome = actions::auth::send_magic_link(
        &client,
        form.email.as_deref(),
        &state.config.email_redirect_to(),
    )
    .await;
    Redirect::to(&outcome.location)
}

async fn register_page(Query(query): Query<RegisterQuery>) -> Response {
    let success = query.success.is_some_and(|s| !s.is_empty());
    no_store(pages::register_page(query.error.as_deref(), success))
}

async fn signup(
    State(state): State<AppState>,
    client: SessionClient,
    Form(credentials): Form<Credentials>,
) -> Redirect {
    let outcome =
        actions::auth::signup(&client, &credentials, &state.config.email_redirect_to()).await;
    Redirect::to(&outcome.location)
}

async fn logout(
    State(state): State<AppState>,
    client: SessionClient,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let outcome = actions::auth::logout(&client).await;
    finish(jar, outcome, state.config.cookie_secure)
}

async fn home(client: SessionClient) -> Response {
    let user = match client.get_user().await {
        Ok(Some(user)) => user,
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(e) => {
            error!("failed to load current user: {}", e);
            return Redirect::to("/login").into_response();
        }
    };

    let tasks = tasks::list_tasks(&client).await.unwrap_or_else(|e| {
        error!("failed to load tasks: {}", e);
        Vec::new()
    });
    let projection = TaskProjection::new(tasks);

    no_store(pages::home_page(&user, &projection))
}

async fn error_page(Query(query): Query<ErrorQuery>) -> Response {
    no_store(pages::error_page(query.kind.as_deref(), query.error.as_deref()))
}

/// Failed task forms land on the error view instead of a JSON body.
fn task_result<T>(result: Result<T, AppError>) -> Redirect {
    match result {
        Ok(_) => Redirect::to("/"),
        Err(e) => Redirect::to(&format!(
            "/error?type=task_error&error={}",
            urlencoding::encode(&e.public_message())
        )),
    }
}

async fn create_task(client: SessionClient, Form(form): Form<TaskForm>) -> Redirect {
    task_result(tasks::create_task(&client, &form.title).await)
}

async fn update_task_status(
    client: SessionClient,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let result = match tasks::parse_status(&id, &form.status) {
        Ok(status) => tasks::update_task_status(&client, &id, status).await,
        Err(e) => Err(e),
    };
    task_result(result)
}

async fn delete_task(client: SessionClient, Path(id): Path<String>) -> Redirect {
    task_result(tasks::delete_task(&client, &id).await)
}
