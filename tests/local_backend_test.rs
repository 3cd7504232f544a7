use std::sync::Arc;

use taskboard::actions::{confirm, tasks};
use taskboard::backend::{BackendClient, BackendError, OtpOptions, OtpType, SessionClient};
use taskboard::error::AppError;
use taskboard::local::LocalBackend;
use taskboard::models::{Credentials, NewTask, Session, TaskStatus};

const REDIRECT_TO: &str = "http://localhost:3000/auth/confirm";

async fn backend() -> Arc<LocalBackend> {
    Arc::new(
        LocalBackend::connect("sqlite::memory:")
            .await
            .expect("Failed to create database"),
    )
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

async fn register_and_login(backend: &LocalBackend, email: &str) -> Session {
    backend
        .sign_up(&credentials(email, "correct horse"), REDIRECT_TO)
        .await
        .expect("sign up");
    backend
        .sign_in_with_password(&credentials(email, "correct horse"))
        .await
        .expect("sign in")
}

fn client(backend: &Arc<LocalBackend>, session: &Session) -> SessionClient {
    SessionClient::new(backend.clone(), Some(session.access_token.clone()))
}

async fn latest_token(backend: &LocalBackend, email: &str) -> (String, String) {
    sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT t.token_hash, t.token_type
        FROM one_time_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE u.email = ?
        ORDER BY t.created_at DESC, t.rowid DESC
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_one(backend.pool())
    .await
    .expect("token issued")
}

#[tokio::test]
async fn password_sign_in_round_trip() {
    let backend = backend().await;
    let session = register_and_login(&backend, "Ada@Example.com").await;

    assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    let user = backend.get_user(&session.access_token).await.unwrap();
    assert_eq!(user.map(|u| u.id), Some(session.user.id.clone()));

    let err = backend
        .sign_in_with_password(&credentials("ada@example.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
}

#[tokio::test]
async fn duplicate_sign_up_is_rejected() {
    let backend = backend().await;
    register_and_login(&backend, "ada@example.com").await;

    let err = backend
        .sign_up(&credentials("ada@example.com", "another one"), REDIRECT_TO)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User already registered");
}

#[tokio::test]
async fn sign_out_revokes_session() {
    let backend = backend().await;
    let session = register_and_login(&backend, "ada@example.com").await;

    backend.sign_out(&session.access_token).await.unwrap();

    assert!(backend.get_user(&session.access_token).await.unwrap().is_none());
}

#[tokio::test]
async fn magic_link_creates_user_and_token_is_single_use() {
    let backend = backend().await;
    let options = OtpOptions {
        should_create_user: true,
        email_redirect_to: REDIRECT_TO.to_string(),
    };
    backend.sign_in_with_otp("new@example.com", &options).await.unwrap();

    let (token_hash, token_type) = latest_token(&backend, "new@example.com").await;
    assert_eq!(token_type, "signup");

    let session = backend.verify_otp(&token_hash, OtpType::Email).await.unwrap();
    assert_eq!(session.user.email.as_deref(), Some("new@example.com"));

    let err = backend.verify_otp(&token_hash, OtpType::Email).await.unwrap_err();
    assert!(matches!(err, BackendError::Api { status: 403, .. }));
}

#[tokio::test]
async fn magic_link_without_account_creation_is_refused() {
    let backend = backend().await;
    let options = OtpOptions {
        should_create_user: false,
        email_redirect_to: REDIRECT_TO.to_string(),
    };

    let err = backend.sign_in_with_otp("ghost@example.com", &options).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn confirm_handler_exchanges_real_token() {
    let backend = backend().await;
    register_and_login(&backend, "ada@example.com").await;
    let options = OtpOptions {
        should_create_user: true,
        email_redirect_to: REDIRECT_TO.to_string(),
    };
    backend.sign_in_with_otp("ada@example.com", &options).await.unwrap();
    let (token_hash, token_type) = latest_token(&backend, "ada@example.com").await;
    assert_eq!(token_type, "magiclink");

    let params = confirm::ConfirmParams {
        token_hash: Some(token_hash),
        otp_type: Some("magiclink".to_string()),
        next: Some("/tasks".to_string()),
        ..Default::default()
    };
    let outcome = confirm::confirm(&SessionClient::anonymous(backend.clone()), &params).await;

    assert_eq!(outcome.location, "/tasks");
}

#[tokio::test]
async fn wrong_token_type_is_rejected() {
    let backend = backend().await;
    let options = OtpOptions {
        should_create_user: true,
        email_redirect_to: REDIRECT_TO.to_string(),
    };
    backend.sign_in_with_otp("new@example.com", &options).await.unwrap();
    let (token_hash, _) = latest_token(&backend, "new@example.com").await;

    assert!(backend.verify_otp(&token_hash, OtpType::Recovery).await.is_err());
    // a mismatched type does not burn the token
    assert!(backend.verify_otp(&token_hash, OtpType::Signup).await.is_ok());
}

#[tokio::test]
async fn created_task_is_trimmed_and_defaults_to_todo() {
    let backend = backend().await;
    let session = register_and_login(&backend, "ada@example.com").await;
    let client = client(&backend, &session);

    let created = tasks::create_task(&client, "  Write report  ").await.unwrap();

    assert_eq!(created.title, "Write report");
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.owner, session.user.id);

    let listed = tasks::list_tasks(&client).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Write report");
}

#[tokio::test]
async fn tasks_are_listed_newest_first() {
    let backend = backend().await;
    let session = register_and_login(&backend, "ada@example.com").await;
    let client = client(&backend, &session);

    for title in ["first", "second", "third"] {
        tasks::create_task(&client, title).await.unwrap();
    }

    let titles: Vec<String> = tasks::list_tasks(&client)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn rows_are_scoped_to_their_owner() {
    let backend = backend().await;
    let ada = register_and_login(&backend, "ada@example.com").await;
    let bob = register_and_login(&backend, "bob@example.com").await;

    let task = tasks::create_task(&client(&backend, &ada), "Ada's task").await.unwrap();
    let bob_client = client(&backend, &bob);

    assert!(tasks::list_tasks(&bob_client).await.unwrap().is_empty());

    let err = tasks::update_task_status(&bob_client, &task.id, TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, AppError::ActionFailed("Failed to update task status")));

    let err = tasks::delete_task(&bob_client, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::ActionFailed("Failed to delete task")));

    let ada_tasks = tasks::list_tasks(&client(&backend, &ada)).await.unwrap();
    assert_eq!(ada_tasks.len(), 1);
    assert_eq!(ada_tasks[0].status, TaskStatus::Todo);
}

#[tokio::test]
async fn owner_can_update_and_delete() {
    let backend = backend().await;
    let session = register_and_login(&backend, "ada@example.com").await;
    let client = client(&backend, &session);
    let task = tasks::create_task(&client, "Write report").await.unwrap();

    let updated = tasks::update_task_status(&client, &task.id, TaskStatus::Doing).await.unwrap();
    assert_eq!(updated.status, TaskStatus::Doing);

    tasks::delete_task(&client, &task.id).await.unwrap();
    assert!(tasks::list_tasks(&client).await.unwrap().is_empty());

    // already gone
    tasks::delete_task(&client, &task.id).await.unwrap();
    let err = tasks::update_task_status(&client, &task.id, TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, AppError::ActionFailed(_)));
}

#[tokio::test]
async fn anonymous_callers_cannot_write() {
    let backend = backend().await;

    let err = backend
        .insert_task(None, &NewTask { title: "sneaky".to_string() })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(backend.select_tasks(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_titles_are_refused_by_the_table_too() {
    let backend = backend().await;
    let session = register_and_login(&backend, "ada@example.com").await;

    let result = backend
        .insert_task(Some(&session.access_token), &NewTask { title: "   ".to_string() })
        .await;
    assert!(result.is_err());
}
