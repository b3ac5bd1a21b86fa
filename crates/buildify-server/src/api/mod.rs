//! Route handlers and the shared request/response plumbing.

pub mod ai;
pub mod auth;
pub mod blobs;
pub mod logo;
pub mod projects;
pub mod studio;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::PgPool;
use uuid::Uuid;

use buildify_core::auth::AuthError;
use buildify_core::generate::GenerateError;
use buildify_core::provider::{ImageModel, TextModel};
use buildify_core::token::TokenConfig;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Process-wide context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub text_model: Arc<dyn TextModel>,
    pub image_model: Arc<dyn ImageModel>,
    pub tokens: Arc<TokenConfig>,
    pub video_delay: Duration,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Duplicate data. Reported as 400, like any other bad input.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// An AI provider call or its output failed.
    pub fn upstream(msg: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            details: Some(err.to_string()),
        }
    }

    /// A database or other internal failure.
    pub fn internal(msg: impl Into<String>, err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            details: Some(format!("{err:#}")),
        }
    }

    /// Map a generation failure, using `msg` as the public message.
    pub fn generation(msg: &str, err: GenerateError) -> Self {
        match err {
            GenerateError::Lookup(e) => Self::internal(msg, e),
            other => Self::upstream(msg, other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Conflict => Self::conflict(err.to_string()),
            AuthError::NotFound => Self::not_found(err.to_string()),
            AuthError::InvalidCredentials => Self::validation(err.to_string()),
            AuthError::Password(e) => Self::internal("Authentication failed", anyhow::Error::new(e)),
            AuthError::Persistence(e) => Self::internal("Authentication failed", e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                error = %self.message,
                details = self.details.as_deref().unwrap_or(""),
                "request failed"
            );
        }
        let mut body = serde_json::json!({ "success": false, "error": self.message });
        if let Some(details) = self.details {
            body["details"] = serde_json::Value::String(details);
        }
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Unwrap a JSON body, turning extractor rejections into 400s with the
/// uniform error body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Require a non-blank string field.
pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Parse a user ID from a path segment or body field.
pub fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    let raw = required(raw, "userId")?;
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid user ID: {raw}")))
}
