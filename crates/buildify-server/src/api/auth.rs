//! `/api/auth`: registration, login and the current-user lookup.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use buildify_core::auth::{self, NewAccount};
use buildify_core::token;

use super::{AppError, AppState, json_body};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    auth::register(
        &state.pool,
        &NewAccount {
            username: &req.username,
            email: &req.email,
            password: &req.password,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "User registered successfully!" })),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let outcome = auth::login(
        &state.pool,
        &state.tokens,
        &req.email,
        &req.password,
        Utc::now(),
    )
    .await?;
    Ok(Json(outcome).into_response())
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(token::bearer_token)
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;

    let claims = token::validate_token(&state.tokens, token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::unauthorized("Invalid or expired token")
    })?;

    let user = auth::current_user(&state.pool, claims.user_id).await?;
    Ok(Json(json!({ "success": true, "user": user })).into_response())
}
