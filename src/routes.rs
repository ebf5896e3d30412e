use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, Method, header::CONTENT_DISPOSITION},
    routing::get,
};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    AppState,
    error::ApiError,
    media::MediaResult,
    proxy::download_file,
    resolver::MediaRequest,
    ui::index,
};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    url: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/download", get(resolve_media))
        .route("/api/download-file", get(download_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn resolve_media(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Json<MediaResult>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        warn!("Rejected /api/download query: {rejection}");
        ApiError::bad_request("URL is required").with_details(rejection.body_text())
    })?;
    let request = MediaRequest::parse(query.url.as_deref())?;
    let result = state.resolver.resolve(&request).await?;
    Ok(Json(result))
}

/// Cross-origin access for a frontend hosted apart from this service, such
/// as the dev server on port 3000. The bundled page is same-origin.
pub fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, ApiError> {
    let allowed_origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|_| {
                ApiError::internal(format!("Invalid origin in ALLOWED_ORIGINS: {origin}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!("CORS allow-list: {allowed_origins:?}");

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET])
        .expose_headers([CONTENT_DISPOSITION]))
}
