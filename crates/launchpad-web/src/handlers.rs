//! Request handlers

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use launchpad_core::{DeployRequest, Error};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{error_response, ApiResponse, AppState, Flattened};

/// Body of `POST /domain/subdomain`
#[derive(Debug, Deserialize)]
pub struct SubdomainRequest {
    pub app_id: Option<String>,
    pub subdomain: Option<String>,
}

/// Body of `POST /domain/custom`
#[derive(Debug, Deserialize)]
pub struct CustomDomainRequest {
    pub app_id: Option<String>,
    pub custom_domain: Option<String>,
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Required string field; blank counts as missing
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

pub async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    info!(
        "Handling deploy request for: {}",
        request.app_id.as_deref().unwrap_or("<new app>")
    );
    match state.deployer.deploy(request).await {
        Ok(outcome) => Json(Flattened::ok(json!({ "deployment": outcome }))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn info(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.deployer.info(&app_id).await {
        Ok(info) => Json(ApiResponse::ok(info)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list(State(state): State<AppState>) -> Response {
    match state.deployer.list().await {
        Ok(infos) => Json(ApiResponse::ok(infos)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    info!("Handling update request for: {}", app_id);
    match state.deployer.update(&app_id, request).await {
        Ok(outcome) => Json(Flattened::ok(json!({ "deployment": outcome }))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    info!("Handling delete request for: {}", app_id);
    match state.deployer.delete(&app_id).await {
        Ok(()) => Json(Flattened::ok(json!({
            "message": format!("App {} deleted successfully", app_id)
        })))
        .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn backup(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    info!("Handling backup request for: {}", app_id);
    match state.deployer.backup(&app_id).await {
        Ok(snapshot) => Json(Flattened::ok(json!({
            "backup_path": snapshot.backup_path,
            "backup_filename": snapshot.backup_filename,
            "created_at": snapshot.created_at,
        })))
        .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn register_subdomain(
    State(state): State<AppState>,
    payload: Result<Json<SubdomainRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let (Some(app_id), Some(subdomain)) = (required(request.app_id), required(request.subdomain))
    else {
        return bad_request("app_id and subdomain are required");
    };

    info!("Handling subdomain request for: {} -> {}", app_id, subdomain);
    match state.deployer.register_subdomain(&app_id, &subdomain).await {
        Ok(registration) => Json(Flattened::ok(registration)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn register_custom_domain(
    State(state): State<AppState>,
    payload: Result<Json<CustomDomainRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let (Some(app_id), Some(custom_domain)) =
        (required(request.app_id), required(request.custom_domain))
    else {
        return bad_request("app_id and custom_domain are required");
    };

    info!(
        "Handling custom domain request for: {} -> {}",
        app_id, custom_domain
    );
    match state
        .deployer
        .register_custom_domain(&app_id, &custom_domain)
        .await
    {
        Ok(registration) => Json(Flattened::ok(registration)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn domain_info(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.deployer.domain_info(&app_id).await {
        Ok(binding) => Json(ApiResponse::ok(binding)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn serve_root(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    serve_file(&state, &app_id, None).await
}

pub async fn serve_path(
    State(state): State<AppState>,
    Path((app_id, path)): Path<(String, String)>,
) -> Response {
    serve_file(&state, &app_id, Some(&path)).await
}

/// Published file with SPA fallback; failures are `{error}` bodies
async fn serve_file(state: &AppState, app_id: &str, path: Option<&str>) -> Response {
    let resolved = match state.deployer.resolve(app_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return serve_error(e),
    };

    match read_published(&resolved).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&resolved).first_or_octet_stream();
            Response::builder()
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content))
                .unwrap_or_else(|e| serve_error(Error::Io(std::io::Error::other(e))))
        }
        Err(e) => serve_error(e),
    }
}

/// A file swapped out by a concurrent republish reads as not found
pub(crate) async fn read_published(path: &std::path::Path) -> Result<Vec<u8>, Error> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.display().to_string())
        } else {
            Error::Io(e)
        }
    })
}

fn serve_error(err: Error) -> Response {
    let status = crate::status_for(&err);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
