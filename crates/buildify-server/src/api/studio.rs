//! `/api/studio`: image editing and the placeholder video generator.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use buildify_core::{datauri, prompt};

use super::{AppError, AppState, json_body, required};

/// Sample clip returned by the video endpoint.
pub const SAMPLE_VIDEO_URL: &str = "https://www.w3schools.com/html/mov_bbb.mp4";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/edit-image", post(edit_image))
        .route("/generate-video", post(generate_video))
        .route("/animate", post(generate_video))
}

#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    /// The source image. Accepted for API compatibility; the image model
    /// only sees the prompt.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub prompt: String,
}

async fn edit_image(
    State(state): State<AppState>,
    payload: Result<Json<EditImageRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let text = required(&req.prompt, "prompt")?;
    tracing::info!(has_source = req.image.is_some(), "studio image requested");

    let image = state
        .image_model
        .generate_image(&prompt::studio_prompt(text))
        .await
        .map_err(|e| AppError::upstream("Studio generation failed", e))?;

    let uri = datauri::encode(&image.mime, &image.bytes);
    Ok(Json(json!({ "success": true, "editedImage": uri })).into_response())
}

/// The body is read only for the log line. A request whose body is absent
/// or not valid JSON still gets the sample clip.
async fn generate_video(State(state): State<AppState>, body: Bytes) -> Response {
    let req: VideoRequest = serde_json::from_slice(&body).unwrap_or_default();
    tracing::info!(
        prompt_chars = req.prompt.len(),
        delay_ms = state.video_delay.as_millis() as u64,
        "video requested"
    );

    tokio::time::sleep(state.video_delay).await;

    Json(json!({
        "success": true,
        "message": "Video generated successfully!",
        "videoUrl": SAMPLE_VIDEO_URL,
    }))
    .into_response()
}
