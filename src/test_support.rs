use std::str::FromStr;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, state::AppState, time::primitive_now_utc};
use crate::db;
use crate::db::models::{Document, User};
use crate::db::types::{SourceType, UserRole};
use crate::repositories;

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
}

/// A private in-memory database with migrations applied. The single
/// connection is never recycled, so the database lives as long as the pool.
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory options")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("memory pool");
    db::run_migrations(&pool).await.expect("migrations");
    pool
}

pub(crate) async fn setup_test_context() -> TestContext {
    let settings = Settings::for_tests("sqlite::memory:");
    let state = AppState::new(settings, memory_pool().await);
    let app = api::router::router(state.clone());
    TestContext { state, app }
}

pub(crate) async fn insert_user(pool: &SqlitePool, name: &str, email: &str) -> User {
    repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            name,
            email,
            role: UserRole::Student,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert user")
}

pub(crate) async fn insert_document(pool: &SqlitePool, user_id: &str) -> Document {
    let id = Uuid::new_v4().to_string();
    repositories::documents::create(
        pool,
        repositories::documents::CreateDocument {
            id: &id,
            user_id,
            source_uri: &format!("uploads/{id}.pdf"),
            source_type: SourceType::Handwritten,
            text_content: None,
            uploaded_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert document")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) fn raw_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body.to_string()))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
