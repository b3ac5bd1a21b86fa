//! `/api/ai`: text generation endpoints.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use buildify_core::generate::{self, GenerateError};
use buildify_core::output::{DesignSystem, MarketAnalysis, SloganList};
use buildify_core::prompt;

use super::{AppError, AppState, json_body, required};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/generate-names", post(generate_names))
        .route("/generate-slogans", post(generate_slogans))
        .route("/chat", post(chat))
        .route("/validate", post(validate))
        .route("/generate-ui", post(generate_ui))
}

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub idea: String,
    #[serde(default)]
    pub industry: String,
}

fn failed(msg: &str) -> impl FnOnce(GenerateError) -> AppError + '_ {
    move |err| AppError::generation(msg, err)
}

async fn generate_names(
    State(state): State<AppState>,
    payload: Result<Json<DescriptionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let description = required(&req.description, "description")?;

    let names =
        generate::generate_available_names(state.text_model.as_ref(), &state.pool, description)
            .await
            .map_err(failed("Name generation failed"))?;
    tracing::info!(count = names.len(), "generated names");

    Ok(Json(json!({ "success": true, "names": names })).into_response())
}

async fn generate_slogans(
    State(state): State<AppState>,
    payload: Result<Json<DescriptionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let description = required(&req.description, "description")?;

    let SloganList { slogans } = generate::generate_structured(
        state.text_model.as_ref(),
        &prompt::slogans_prompt(description),
    )
    .await
    .map_err(failed("Slogan generation failed"))?;

    Ok(Json(json!({ "success": true, "slogans": slogans })).into_response())
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let message = required(&req.message, "message")?;

    let reply = generate::generate_text(
        state.text_model.as_ref(),
        &prompt::chat_conversation(req.context.trim(), message),
    )
    .await
    .map_err(failed("Chat failed"))?;

    Ok(Json(json!({ "success": true, "reply": reply })).into_response())
}

async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let idea = required(&req.idea, "idea")?;

    let analysis: MarketAnalysis = generate::generate_structured(
        state.text_model.as_ref(),
        &prompt::validation_prompt(idea, req.industry.trim()),
    )
    .await
    .map_err(failed("Validation failed"))?;
    tracing::info!(score = analysis.score, "validated idea");

    Ok(Json(json!({ "success": true, "analysis": analysis })).into_response())
}

async fn generate_ui(
    State(state): State<AppState>,
    payload: Result<Json<DescriptionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let description = required(&req.description, "description")?;

    let design: DesignSystem = generate::generate_structured(
        state.text_model.as_ref(),
        &prompt::design_prompt(description),
    )
    .await
    .map_err(failed("UI generation failed"))?;

    Ok(Json(json!({ "success": true, "design": design })).into_response())
}
