//! `/api/logo`: logo image generation.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use buildify_core::{datauri, prompt};

use super::ai::DescriptionRequest;
use super::{AppError, AppState, json_body, required};

pub fn routes() -> Router<AppState> {
    Router::new().route("/generate-logo", post(generate_logo))
}

async fn generate_logo(
    State(state): State<AppState>,
    payload: Result<Json<DescriptionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let description = required(&req.description, "description")?;

    let image = state
        .image_model
        .generate_image(&prompt::logo_prompt(description))
        .await
        .map_err(|e| AppError::upstream("Logo generation failed", e))?;
    tracing::info!(
        model = state.image_model.name(),
        mime = %image.mime,
        size = image.bytes.len(),
        "generated logo"
    );

    let uri = datauri::encode(&image.mime, &image.bytes);
    Ok(Json(json!({ "success": true, "image": uri })).into_response())
}
