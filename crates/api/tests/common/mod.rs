#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use runlet_core::scripting::python::DEFAULT_PYTHON;
use runlet_core::scripting::runner::ScriptRunner;
use runlet_core::worker_pool::PoolConfig;
use runlet_db::models::user::{CreateUser, User};
use runlet_db::repositories::UserRepo;
use runlet_db::DbPool;
use serde_json::Value;
use tower::ServiceExt;

use runlet_api::auth::jwt::{generate_token, JwtConfig};
use runlet_api::auth::password::hash_password;
use runlet_api::config::ServerConfig;
use runlet_api::engine::dispatcher::Dispatcher;
use runlet_api::router::build_app_router;
use runlet_api::state::AppState;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        worker_pool: PoolConfig {
            workers: 4,
            queue_capacity: 64,
        },
        script_timeout_secs: 10,
        python_interpreter: DEFAULT_PYTHON.to_string(),
        static_dir: PathBuf::from("does-not-exist"),
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_hours: 24,
        },
        admin_username: "admin".to_string(),
        admin_password: "admin".to_string(),
    }
}

/// Build application state with its own worker pool from `config`.
pub fn build_test_state_with(pool: DbPool, config: ServerConfig) -> AppState {
    let dispatcher = Dispatcher::start(
        pool.clone(),
        config.worker_pool,
        ScriptRunner::default(),
        config.script_timeout(),
    )
    .expect("worker pool config is valid");

    AppState {
        pool,
        config: Arc::new(config),
        dispatcher: Arc::new(dispatcher),
    }
}

pub fn build_test_state(pool: DbPool) -> AppState {
    build_test_state_with(pool, test_config())
}

/// Build the full application router with the production middleware stack.
pub async fn build_test_app(pool: DbPool) -> Router {
    let state = build_test_state(pool);
    let config = Arc::clone(&state.config);
    build_app_router(state, &config)
}

pub fn app_for(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

/// Create a user with a real Argon2 hash. Returns the user and the plaintext password.
pub async fn create_test_user(pool: &DbPool, username: &str) -> (User, String) {
    let password = format!("{username}-password");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash: hash_password(&password).expect("hash"),
        },
    )
    .await
    .expect("create user");
    (user, password)
}

/// Mint a token for `user_id` without going through login.
pub fn token_for(user_id: i64) -> String {
    generate_token(user_id, &test_config().jwt).expect("token")
}

/// Create a user (without a usable password) and return a token for it.
pub async fn test_token(pool: &DbPool) -> String {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: "tester".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("create user");
    token_for(user.id)
}

/// Log in through the API and return the bearer token.
pub async fn login_for_token(app: Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    let json = body_json(response).await;
    json["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(
        app,
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

// ---------------------------------------------------------------------------
// Script / execution helpers
// ---------------------------------------------------------------------------

/// Register a script through the API and return its id.
pub async fn create_script(
    app: Router,
    token: &str,
    name: &str,
    script_type: &str,
    content: &str,
) -> i64 {
    let body = serde_json::json!({
        "name": name,
        "script_type": script_type,
        "content": content,
    });
    let response = post_json_auth(app, "/api/scripts", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("script id")
}

/// Run a script through the API and return the new execution id.
pub async fn run_script(app: Router, token: &str, script_id: i64) -> i64 {
    let response = post_auth(app, &format!("/api/scripts/{script_id}/run"), token).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    body_json(response).await["data"]["execution_id"]
        .as_i64()
        .expect("execution id")
}

/// Poll an execution until it leaves `running`. Panics after 15 seconds.
pub async fn wait_for_terminal(app: Router, token: &str, execution_id: i64) -> Value {
    for _ in 0..300 {
        let response = get_auth(
            app.clone(),
            &format!("/api/executions/{execution_id}"),
            token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["data"]["status"] != "running" {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("execution {execution_id} never reached a terminal state");
}

/// Poll the health endpoint until `in_flight` reaches `count`.
pub async fn wait_for_in_flight(app: Router, count: u64) {
    for _ in 0..200 {
        let json = body_json(get(app.clone(), "/health").await).await;
        if json["in_flight"].as_u64() == Some(count) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("in_flight never reached {count}");
}
