//! `/api/projects`: saving and listing a user's branding projects.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use buildify_core::datauri;
use buildify_core::images::{self, Logo, SaveError};
use buildify_db::models::Project;
use buildify_db::queries::{projects, users};

use super::{AppError, AppState, json_body, parse_user_id, required};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_project))
        .route("/user/{user_id}", get(list_projects))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub slogan: Option<String>,
    /// A `data:` URI, or the `/api/blobs/<digest>` path of an image that
    /// is already stored.
    #[serde(default)]
    pub logo_image: Option<String>,
}

/// A project as the API presents it: the logo is a blob path, not bytes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub business_name: String,
    pub slogan: Option<String>,
    pub logo_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectView {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            description: p.description,
            business_name: p.business_name,
            slogan: p.slogan,
            logo_image: p.logo_digest.as_deref().map(images::blob_path),
            created_at: p.created_at,
        }
    }
}

/// Map a save failure to the uniform error body.
fn save_failed(err: SaveError) -> AppError {
    match err {
        SaveError::UnknownLogo(_) => AppError::validation(err.to_string()),
        SaveError::Persistence(e) => AppError::internal("Failed to save project", e),
    }
}

async fn save_project(
    State(state): State<AppState>,
    payload: Result<Json<SaveProjectRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(payload)?;
    if req.user_id.trim().is_empty() || req.business_name.trim().is_empty() {
        return Err(AppError::validation(
            "User ID and Business Name are required",
        ));
    }
    let user_id = parse_user_id(&req.user_id)?;
    let business_name = required(&req.business_name, "businessName")?;

    users::get_user(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("Failed to save project", e))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let logo = req
        .logo_image
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    // A data URI is decoded up front; anything else must name a stored blob.
    let upload = match logo {
        Some(l) if images::parse_blob_path(l).is_none() => Some(
            datauri::parse(l)
                .map_err(|e| AppError::validation(format!("invalid logoImage: {e}")))?,
        ),
        _ => None,
    };
    let logo = upload.as_ref().map(Logo::Upload).or_else(|| {
        logo.and_then(images::parse_blob_path)
            .map(Logo::Stored)
    });
    let slogan = req
        .slogan
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let project = images::save_project_with_logo(
        &state.pool,
        &projects::NewProject {
            user_id,
            description: req.description.as_deref().unwrap_or("").trim(),
            business_name,
            slogan,
            logo_digest: None,
        },
        logo,
    )
    .await
    .map_err(save_failed)?;
    tracing::info!(%user_id, project_id = %project.id, "project saved");

    Ok(Json(json!({
        "success": true,
        "message": "Project Saved!",
        "project": ProjectView::from(project),
    }))
    .into_response())
}

async fn list_projects(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let projects: Vec<ProjectView> = projects::list_projects_for_user(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch projects", e))?
        .into_iter()
        .map(ProjectView::from)
        .collect();

    Ok(Json(json!({ "success": true, "projects": projects })).into_response())
}
