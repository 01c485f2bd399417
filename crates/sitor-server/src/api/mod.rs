//! HTTP surface: router, shared state, and request plumbing.

mod accounts;
mod chat;
mod detections;
mod groups;
mod sessions;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tokio::net::TcpListener;
use tracing::{info, warn};

use sitor_shared::ObjectId;

use crate::auth::TokenKeys;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenKeys>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Store, config: ServerConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenKeys::new(&config.secret_key, config.token_ttl_hours)),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION]);

    let api = Router::new()
        // Accounts
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/me", get(accounts::me).patch(accounts::update_profile))
        .route("/me/password", patch(accounts::update_password))
        .route("/me/summary", get(detections::summary))
        // Groups
        .route("/groups", get(groups::list).post(groups::create))
        .route("/groups/join", post(groups::join))
        .route("/groups/:id", delete(groups::remove))
        .route("/groups/:id/members", get(groups::members))
        .route("/groups/:id/leave", post(groups::leave))
        // Sessions
        .route("/groups/:id/start-session", post(sessions::start))
        .route("/groups/:id/end-session", post(sessions::end))
        .route(
            "/groups/:id/camera-status",
            get(sessions::camera_status).post(sessions::update_camera_status),
        )
        .route("/groups/:id/history", get(detections::history))
        // Detections
        .route("/detections", post(detections::submit))
        .route("/detections/:id", get(detections::list))
        // Chat
        .route("/chat-history", get(chat::history).post(chat::append));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C, letting in-flight requests finish.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    info!(addr = %addr, "Starting HTTP API server");

    let listener = TcpListener::bind(addr).await?;
    serve_until(listener, state, ctrl_c()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then drain
/// open connections.
pub async fn serve_until<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP API server stopped");
    Ok(())
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    let body = serde_json::json!({
        "success": false,
        "message": "Internal server error",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// JSON body extractor whose rejection uses the API's error shape.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ServerError::BadRequest("Invalid request".into()))
            }
        }
    }
}

/// Parse a hex identity from a path or body field.
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<ObjectId, ServerError> {
    ObjectId::from_hex(raw.trim()).map_err(|_| ServerError::BadRequest(format!("Invalid {field}")))
}

/// `{"success": true}` plus an optional human-readable message.
#[derive(Serialize)]
pub(crate) struct Ack {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl Ack {
    pub(crate) fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
        })
    }

    pub(crate) fn with_message(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex(), "groupId").unwrap(), id);
        let err = parse_id("xyz", "groupId").unwrap_err();
        assert_eq!(err.to_string(), "Invalid groupId");
    }
}
