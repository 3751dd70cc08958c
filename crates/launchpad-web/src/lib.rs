//! Launchpad Web API Server
//!
//! REST endpoints for deployments and domains, plus static serving of
//! published apps.

mod handlers;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use launchpad_core::{Error, ErrorKind};
use launchpad_deploy::Deployer;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Success body whose fields sit next to `success` instead of under `data`
#[derive(Serialize)]
pub struct Flattened<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Flattened<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Status code for a core error
pub fn status_for(err: &Error) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: Error) -> Response {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("Request failed: {}", err);
    }
    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    deployer: Arc<Deployer>,
}

impl AppState {
    pub fn new(deployer: Arc<Deployer>) -> Self {
        Self { deployer }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Deployments
        .route("/deploy", post(handlers::deploy))
        .route("/info/:app_id", get(handlers::info))
        .route("/list", get(handlers::list))
        .route("/update/:app_id", put(handlers::update))
        .route("/delete/:app_id", delete(handlers::delete_app))
        .route("/backup/:app_id", post(handlers::backup))
        // Domains
        .route("/domain/subdomain", post(handlers::register_subdomain))
        .route("/domain/custom", post(handlers::register_custom_domain))
        .route("/domain/info/:app_id", get(handlers::domain_info))
        // Published apps
        .route("/serve/:app_id", get(handlers::serve_root))
        .route("/serve/:app_id/*path", get(handlers::serve_path))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `bind_addr` until `shutdown` resolves
pub async fn start_server<F>(
    bind_addr: &str,
    deployer: Arc<Deployer>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(deployer));

    info!("Starting Launchpad API on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
