//! `/api/blobs`: stored project images.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use buildify_core::images;
use buildify_db::queries::blobs;

use super::{AppError, AppState};

/// Stored images are never rendered as documents on the API origin.
const BLOB_CSP: &str = "default-src 'none'; sandbox";

pub fn routes() -> Router<AppState> {
    Router::new().route("/{digest}", get(get_blob))
}

async fn get_blob(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> Result<Response, AppError> {
    if !images::is_content_digest(&digest) {
        return Err(AppError::not_found("Image not found"));
    }
    let blob = blobs::get_blob(&state.pool, &digest)
        .await
        .map_err(|e| AppError::internal("Failed to load image", e))?
        .ok_or_else(|| AppError::not_found("Image not found"))?;

    // Content-addressed, so the bytes behind a digest never change.
    Ok((
        [
            (header::CONTENT_TYPE, blob.mime),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_owned(),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_owned()),
            (
                header::CONTENT_SECURITY_POLICY,
                BLOB_CSP.to_owned(),
            ),
        ],
        blob.data,
    )
        .into_response())
}
