//! Axum-based HTTP gateway for the account service.
//!
//! - Request body size limit (64KB max)
//! - Request timeout (30s)
//! - Permissive CORS for browser clients
//! - Per-request logging via `tower_http::trace`
//!
//! Every failure is answered with a JSON `{"error": "..."}` body.

use crate::auth::{
    AccountError, AccountService, PasswordHasher, ProfileUpdate, SigninRequest, SignupRequest,
    TokenService, UserStore,
};
use crate::config::Config;
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(accounts: AccountService) -> Self {
        Self {
            accounts: Arc::new(accounts),
        }
    }
}

/// Run the HTTP gateway until Ctrl-C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let tokens = TokenService::new(&config.jwt_secret)?;
    let store = Arc::new(UserStore::open(&config.db_path)?);
    tracing::info!(
        path = %config.db_path.display(),
        users = store.user_count(),
        "User store ready"
    );

    let state = AppState::new(AccountService::new(store, PasswordHasher::new(), tokens));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Account service listening on http://{local_addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Account service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Build the router with all routes and middleware attached.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Millis),
        );

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/signup", post(handle_signup))
        .route("/signin", post(handle_signin))
        .route("/user", get(handle_user))
        .route("/profile", put(handle_profile_update))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(trace)
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Concrete return type for JSON handlers (avoids `impl IntoResponse` inference issues).
type ApiResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(err: &AccountError) -> ApiResponse {
    if err.is_internal() {
        tracing::error!("Request failed: {err}");
    }
    (
        err.status_code(),
        Json(serde_json::json!({"error": err.client_message()})),
    )
}

/// Unparsable or ill-shaped JSON is a 400; size and content-type rejections
/// keep the status axum assigned them (413, 415).
fn rejected_body(rejection: &JsonRejection) -> ApiResponse {
    let status = match rejection.status() {
        StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
        other => other,
    };
    (
        status,
        Json(serde_json::json!({"error": format!("Invalid request: {}", rejection.body_text())})),
    )
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn require_token(headers: &HeaderMap) -> Result<&str, ApiResponse> {
    extract_bearer_token(headers).ok_or_else(|| error_response(&AccountError::MissingToken))
}

/// GET / — plain welcome text
async fn handle_root() -> &'static str {
    "Welcome to the API!"
}

/// GET /health — always public
async fn handle_health(State(state): State<AppState>) -> ApiResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "users": state.accounts.store().user_count(),
        })),
    )
}

/// POST /signup — create a new user account.
async fn handle_signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return rejected_body(&e),
    };

    match state.accounts.signup(body).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "User registered successfully",
                "id": id,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /signin — verify credentials and issue an access token.
async fn handle_signin(
    State(state): State<AppState>,
    body: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return rejected_body(&e),
    };

    match state.accounts.signin(&body.username, &body.password).await {
        Ok(token) => (
            StatusCode::OK,
            Json(serde_json::json!({"accessToken": token})),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /user — profile of the token holder, without the password hash.
async fn handle_user(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let token = match require_token(&headers) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match state.accounts.get_profile(token) {
        Ok(profile) => (StatusCode::OK, Json(serde_json::json!(profile))),
        Err(e) => error_response(&e),
    }
}

/// PUT /profile — partial update of the token holder's profile.
async fn handle_profile_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResponse {
    let token = match require_token(&headers) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return rejected_body(&e),
    };

    match state.accounts.update_profile(token, body).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Profile updated successfully"})),
        ),
        Err(e) => error_response(&e),
    }
}
