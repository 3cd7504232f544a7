use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{Task, TaskStatus, User};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: Some(row.email),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OneTimeTokenRow {
    pub token_hash: String,
    pub user_id: String,
    pub token_type: String,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, email, password_hash FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, email, password_hash FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_user(
    db: &SqlitePool,
    email: &str,
    password_hash: Option<&str>,
) -> Result<UserRow, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .execute(db)
    .await?;

    Ok(UserRow {
        id,
        email: email.to_string(),
        password_hash: password_hash.map(str::to_string),
    })
}

/// Opens a session for `user_id`; returns `(access_token, refresh_token)`.
pub async fn insert_session(db: &SqlitePool, user_id: &str) -> Result<(String, String), sqlx::Error> {
    let access_token = Uuid::new_v4().simple().to_string();
    let refresh_token = Uuid::new_v4().simple().to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (access_token, refresh_token, user_id, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&access_token)
    .bind(&refresh_token)
    .bind(user_id)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok((access_token, refresh_token))
}

pub async fn find_user_by_access_token(
    db: &SqlitePool,
    access_token: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT users.id, users.email, users.password_hash
        FROM sessions
        JOIN users ON users.id = sessions.user_id
        WHERE sessions.access_token = ?
        "#,
    )
    .bind(access_token)
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: &SqlitePool, access_token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE access_token = ?")
        .bind(access_token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn insert_one_time_token(
    db: &SqlitePool,
    user_id: &str,
    token_type: &str,
) -> Result<String, sqlx::Error> {
    let token_hash = Uuid::new_v4().simple().to_string();

    sqlx::query(
        r#"
        INSERT INTO one_time_tokens (token_hash, user_id, token_type, created_at, consumed_at)
        VALUES (?1, ?2, ?3, ?4, NULL)
        "#,
    )
    .bind(&token_hash)
    .bind(user_id)
    .bind(token_type)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(token_hash)
}

pub async fn find_one_time_token(
    db: &SqlitePool,
    token_hash: &str,
) -> Result<Option<OneTimeTokenRow>, sqlx::Error> {
    sqlx::query_as::<_, OneTimeTokenRow>(
        "SELECT token_hash, user_id, token_type, created_at, consumed_at FROM one_time_tokens WHERE token_hash = ?",
    )
    .bind(token_hash)
    .fetch_optional(db)
    .await
}

/// Marks the token used. Returns false when another request got there first.
pub async fn consume_one_time_token(db: &SqlitePool, token_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE one_time_tokens
        SET consumed_at = ?2
        WHERE token_hash = ?1 AND consumed_at IS NULL
        "#,
    )
    .bind(token_hash)
    .bind(Utc::now())
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_tasks(db: &SqlitePool, owner: &str) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, status, created_at, owner
        FROM tasks
        WHERE owner = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(owner)
    .fetch_all(db)
    .await
}

pub async fn find_task(db: &SqlitePool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT id, title, status, created_at, owner FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_task(db: &SqlitePool, owner: &str, title: &str) -> Result<Task, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let status = TaskStatus::default();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, title, status, created_at, owner)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&id)
    .bind(title)
    .bind(status)
    .bind(now)
    .bind(owner)
    .execute(db)
    .await?;

    Ok(Task {
        id,
        title: title.to_string(),
        status,
        created_at: now,
        owner: owner.to_string(),
    })
}

pub async fn update_task_status(
    db: &SqlitePool,
    id: &str,
    owner: &str,
    status: TaskStatus,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET status = ?1
        WHERE id = ?2 AND owner = ?3
        RETURNING id, title, status, created_at, owner
        "#,
    )
    .bind(status)
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn delete_task(db: &SqlitePool, id: &str, owner: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        DELETE FROM tasks
        WHERE id = ?1 AND owner = ?2
        RETURNING id, title, status, created_at, owner
        "#,
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}
