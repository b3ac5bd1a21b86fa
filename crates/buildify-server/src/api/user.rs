//! `/api/user`: profile, settings, plan and data deletion.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use buildify_db::is_unique_violation;
use buildify_db::models::{PublicUser, SubscriptionPlan};
use buildify_db::queries::users::{self, SettingsUpdate};
use buildify_db::queries::projects;

use super::{AppError, AppState, json_body, parse_user_id, required};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/update", put(update_settings))
        .route("/upgrade", post(upgrade_plan))
        .route("/delete-data", delete(delete_data))
        .route("/{user_id}", get(get_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub user_id: String,
    pub notifications: Option<bool>,
    pub two_factor: Option<bool>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub new_plan: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataRequest {
    #[serde(default)]
    pub user_id: String,
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let user = users::get_user(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("Server Error", e))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({ "success": true, "user": PublicUser::from(user) })).into_response())
}

async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let user_id = parse_user_id(&req.user_id)?;
    let username = match req.username.as_deref() {
        Some(name) => Some(required(name, "username")?),
        None => None,
    };
    tracing::info!(%user_id, "updating settings");

    let update = SettingsUpdate {
        notifications: req.notifications,
        two_factor: req.two_factor,
        username,
    };
    let user = match users::update_settings(&state.pool, user_id, &update).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::conflict("Username already taken"));
        }
        Err(e) => return Err(AppError::internal("Update failed", e)),
    }
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "user": PublicUser::from(user),
        "message": "Settings saved successfully!",
    }))
    .into_response())
}

async fn upgrade_plan(
    State(state): State<AppState>,
    payload: Result<Json<UpgradeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let plan: SubscriptionPlan = req
        .new_plan
        .parse()
        .map_err(|_| AppError::validation("Invalid Plan Selected"))?;
    let user_id = parse_user_id(&req.user_id)?;
    tracing::info!(%user_id, %plan, "upgrading plan");

    let user = users::update_plan(&state.pool, user_id, plan)
        .await
        .map_err(|e| AppError::internal("Upgrade failed", e))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Plan upgraded to {plan}!"),
        "user": PublicUser::from(user),
    }))
    .into_response())
}

async fn delete_data(
    State(state): State<AppState>,
    payload: Result<Json<DeleteDataRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    let user_id = parse_user_id(&req.user_id)?;
    tracing::warn!(%user_id, "deleting all project data");

    let deleted = projects::delete_projects_for_user(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("Delete failed", e))?;
    tracing::info!(%user_id, deleted, "project data deleted");

    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully deleted {deleted} projects."),
        "deletedCount": deleted,
    }))
    .into_response())
}
