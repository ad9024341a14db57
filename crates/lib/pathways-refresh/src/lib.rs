//! HTTP refresh server for pathways-mcp.
//!
//! Lets the publishing pipeline trigger a reload of the configured snapshot
//! source or push a complete snapshot, and reports what is being served.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use pathways_core::catalog::CatalogStatus;
use pathways_core::control::ControlError;
use pathways_core::services::{CatalogHandle, RefreshError, RefreshReport};
use pathways_store::models::Snapshot;
use serde::Serialize;
use tracing::{info, warn};

/// Configuration for the refresh HTTP server.
#[derive(Debug, Clone)]
pub struct RefreshServerConfig {
    pub addr: SocketAddr,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl RefreshServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            max_body_bytes: 64 * 1024 * 1024,
            request_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for RefreshServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::LOCALHOST, 4031)))
    }
}

/// HTTP refresh server wrapper.
pub struct RefreshServer {
    config: RefreshServerConfig,
    state: AppState,
}

impl RefreshServer {
    #[must_use]
    pub const fn new(catalog: CatalogHandle, config: RefreshServerConfig) -> Self {
        let state = AppState {
            catalog,
            request_timeout: config.request_timeout,
        };
        Self { config, state }
    }

    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.state, self.config.max_body_bytes);

        info!("pathways-refresh listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    catalog: CatalogHandle,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    const fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    fn timeout() -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            "refresh request timed out".to_string(),
        )
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        let status = match &err {
            RefreshError::InProgress => StatusCode::CONFLICT,
            RefreshError::NoSource => StatusCode::BAD_REQUEST,
            RefreshError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RefreshError::Store(_) => StatusCode::BAD_GATEWAY,
            RefreshError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        let status = match &err {
            ControlError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ControlError::NotFound { .. } => StatusCode::NOT_FOUND,
            ControlError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() || self.status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(status = %self.status, error = %self.message, "refresh request failed");
        }
        let payload = Json(ErrorResponse { error: self.message });
        (self.status, payload).into_response()
    }
}

fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .route("/snapshot", post(push_snapshot))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> Result<Json<CatalogStatus>, ApiError> {
    let status = state.catalog.status().ok_or(ControlError::Unavailable)?;
    Ok(Json(status))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshReport>, ApiError> {
    let report = tokio::time::timeout(state.request_timeout, state.catalog.refresh())
        .await
        .map_err(|_| ApiError::timeout())??;
    Ok(Json(report))
}

async fn push_snapshot(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> Result<Json<RefreshReport>, ApiError> {
    let report = tokio::time::timeout(state.request_timeout, state.catalog.install(snapshot))
        .await
        .map_err(|_| ApiError::timeout())??;
    Ok(Json(report))
}
