use tracing::error;

use crate::backend::SessionClient;
use crate::error::AppError;
use crate::models::{NewTask, Task, TaskStatus};

pub const TITLE_REQUIRED: &str = "Task title is required";
pub const UPDATE_FAILED: &str = "Failed to update task status";

/// Authoritative read of the caller's tasks, newest first.
pub async fn list_tasks(client: &SessionClient) -> Result<Vec<Task>, AppError> {
    Ok(client.select_tasks().await?)
}

pub async fn create_task(client: &SessionClient, title: &str) -> Result<Task, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest(TITLE_REQUIRED.to_string()));
    }

    let new_task = NewTask {
        title: title.to_string(),
    };
    client.insert_task(&new_task).await.map_err(|e| {
        error!("create task failed: {}", e);
        AppError::ActionFailed("Failed to create task")
    })
}

/// Form and JSON input arrive untyped; an unknown status fails like any
/// other rejected update.
pub fn parse_status(id: &str, raw: &str) -> Result<TaskStatus, AppError> {
    raw.parse::<TaskStatus>().map_err(|e| {
        error!("update task {} failed: {}", id, e);
        AppError::ActionFailed(UPDATE_FAILED)
    })
}

/// Last write wins. An id that matches no visible row is a failure.
pub async fn update_task_status(
    client: &SessionClient,
    id: &str,
    status: TaskStatus,
) -> Result<Task, AppError> {
    let rows = client.update_task_status(id, status).await.map_err(|e| {
        error!("update task {} failed: {}", id, e);
        AppError::ActionFailed(UPDATE_FAILED)
    })?;

    rows.into_iter().next().ok_or_else(|| {
        error!("update task {} matched no rows", id);
        AppError::ActionFailed(UPDATE_FAILED)
    })
}

/// Deleting an id that is already gone succeeds.
pub async fn delete_task(client: &SessionClient, id: &str) -> Result<(), AppError> {
    client.delete_task(id).await.map_err(|e| {
        error!("delete task {} failed: {}", id, e);
        AppError::ActionFailed("Failed to delete task")
    })?;
    Ok(())
}
