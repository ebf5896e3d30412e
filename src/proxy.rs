use axum::{
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderValue,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{AppState, error::ApiError};

const DEFAULT_FILENAME: &str = "mediafetch_video.mp4";
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Deserialize)]
pub struct DownloadFileQuery {
    url: Option<String>,
    filename: Option<String>,
}

/// Re-fetches a resolved media URL and streams it back as an attachment, so
/// mobile browsers save the file instead of playing it inline.
pub async fn download_file(
    State(state): State<AppState>,
    query: Result<Query<DownloadFileQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        warn!("Rejected /api/download-file query: {rejection}");
        ApiError::bad_request("Valid URL is required")
    })?;
    let url = query
        .url
        .as_deref()
        .filter(|url| url.starts_with("https://"))
        .ok_or_else(|| ApiError::bad_request("Valid URL is required"))?;
    let filename = query
        .filename
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILENAME);

    let media = state.transport.fetch_media(url).await.map_err(|error| {
        error!("Download proxy error for {url:?}: {error}");
        ApiError::internal("Failed to download file")
    })?;

    if !media.status.is_success() {
        warn!(
            "Upstream answered {} for proxied download {url:?}",
            media.status
        );
        return Err(ApiError::new(media.status, "Failed to fetch media"));
    }

    let content_type = media
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(filename))
        .map_err(|_| ApiError::internal("Failed to download file"))?;

    info!("Streaming {url:?} as {filename:?}");

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        Body::from_stream(media.body),
    )
        .into_response())
}

fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", sanitize_filename(filename))
}

/// Replaces every character outside `[a-zA-Z0-9._-]` with `_`.
pub fn sanitize_filename(value: &str) -> String {
    value
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-') {
                character
            } else {
                '_'
            }
        })
        .collect()
}
