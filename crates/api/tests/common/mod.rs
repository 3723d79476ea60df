#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use questy_api::auth::jwt::{generate_access_token, JwtConfig};
use questy_api::config::ServerConfig;
use questy_api::router::build_app_router;
use questy_api::state::AppState;
use questy_events::{
    EmailError, EventBus, InvitationQueue, InvitationSender, InviteTemplate, QueueConfig,
    RenderedEmail,
};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        public_url: "https://questy.fun".to_string(),
        invitation_image_url: None,
        mailing_enabled: false,
        invitation_queue: QueueConfig::default(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the application router over `pool` with mailing disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(pool, None)
}

fn build_app(pool: PgPool, invitations: Option<InvitationQueue>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        invitations,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Invitation capture
// ---------------------------------------------------------------------------

/// Records every invitation the worker sends.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(String, RenderedEmail)>>,
}

#[async_trait]
impl InvitationSender for RecordingSender {
    async fn send(&self, to_email: &str, message: &RenderedEmail) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), message.clone()));
        Ok(())
    }
}

/// Router with a live invitation worker. Cancel the token and await the
/// handle to drain the queue before inspecting the sender.
pub fn build_test_app_with_mailer(
    pool: PgPool,
) -> (
    Router,
    Arc<RecordingSender>,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let sender = Arc::new(RecordingSender::default());
    let cancel = CancellationToken::new();
    let (queue, handle) = InvitationQueue::start(
        sender.clone(),
        InviteTemplate::new("https://questy.fun", None).unwrap(),
        QueueConfig::default(),
        cancel.clone(),
    );
    (build_app(pool, Some(queue)), sender, cancel, handle)
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// A caller with a signed bearer token.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn user(email: &str, name: &str) -> TestUser {
    let id = Uuid::new_v4();
    let token = generate_access_token(id, email, name, &test_config().jwt).unwrap();
    TestUser {
        id,
        email: email.to_string(),
        token,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, "POST", uri, token, body).await
}

/// POST a raw body, optionally with a `content-type` header.
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    token: &str,
    content_type: Option<&str>,
    body: &str,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, "PUT", uri, token, body).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// The two-step quest used across progression tests.
pub fn paris_quest() -> serde_json::Value {
    serde_json::json!({
        "name": "City quiz",
        "description": "Two questions",
        "theme": "classic",
        "final_message": "You made it!",
        "steps": [
            {
                "sort": 0,
                "question_type": "text",
                "question_content": "Capital of France?",
                "answer_content": ["Paris"]
            },
            {
                "sort": 1,
                "question_type": "text",
                "question_content": "Meaning of life?",
                "answer_content": ["42"]
            }
        ]
    })
}

/// Create `body` as `owner` and return the new quest id.
pub async fn create_quest(app: &Router, owner: &TestUser, body: serde_json::Value) -> String {
    let response = post_json_auth(app.clone(), "/api/v1/quests", &owner.token, body).await;
    assert_eq!(response.status(), 201);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

/// Send quest `id` from `owner` to `email`.
pub async fn send_quest(app: &Router, owner: &TestUser, id: &str, email: &str) -> Response<Body> {
    post_json_auth(
        app.clone(),
        &format!("/api/v1/quests/{id}/send"),
        &owner.token,
        serde_json::json!({ "email": email, "name": "Robin" }),
    )
    .await
}
