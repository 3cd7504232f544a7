use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::actions::tasks;
use crate::backend::SessionClient;
use crate::error::AppError;
use crate::models::{Task, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", patch(update_task).delete(delete_task))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn require_user(client: &SessionClient) -> Result<User, AppError> {
    client.get_user().await?.ok_or(AppError::Unauthorized)
}

async fn list_tasks(client: SessionClient) -> Result<Json<Vec<Task>>, AppError> {
    require_user(&client).await?;
    let tasks = tasks::list_tasks(&client).await?;
    Ok(Json(tasks))
}

async fn create_task(
    client: SessionClient,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    require_user(&client).await?;
    let task = tasks::create_task(&client, &req.title).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    client: SessionClient,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    require_user(&client).await?;
    let status = tasks::parse_status(&id, &req.status)?;
    let task = tasks::update_task_status(&client, &id, status).await?;
    Ok(Json(task))
}

async fn delete_task(
    client: SessionClient,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_user(&client).await?;
    tasks::delete_task(&client, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
