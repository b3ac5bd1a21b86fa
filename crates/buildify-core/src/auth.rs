//! Account registration and login.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use buildify_db::is_unique_violation;
use buildify_db::models::{PublicUser, User};
use buildify_db::queries::users;

use crate::password::{self, PasswordError};
use crate::token::{self, TokenConfig};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    Conflict,

    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// The identity summary returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: LoginUser,
}

/// Create an account. The password is stored only as an Argon2 hash.
///
/// Fails with [`AuthError::Conflict`] when the email is already registered,
/// including when a concurrent registration wins the race and the database
/// uniqueness constraint fires (email or username).
pub async fn register(pool: &PgPool, account: &NewAccount<'_>) -> Result<User, AuthError> {
    let username = account.username.trim();
    let email = account.email.trim();
    if username.is_empty() || email.is_empty() || account.password.is_empty() {
        return Err(AuthError::Validation(
            "username, email and password are required".to_owned(),
        ));
    }

    if users::get_user_by_email(pool, email).await?.is_some() {
        return Err(AuthError::Conflict);
    }

    let hash = password::hash_password(account.password)?;
    let user = match users::insert_user(pool, username, email, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => return Err(AuthError::Conflict),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Check credentials and issue a bearer token.
///
/// An unknown email is [`AuthError::NotFound`]; a wrong password is
/// [`AuthError::InvalidCredentials`].
pub async fn login(
    pool: &PgPool,
    tokens: &TokenConfig,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<LoginOutcome, AuthError> {
    let user = users::get_user_by_email(pool, email.trim())
        .await?
        .ok_or(AuthError::NotFound)?;

    if !password::verify_password(&user.password_hash, password)? {
        return Err(AuthError::InvalidCredentials);
    }

    let token = token::issue_token(tokens, user.id, now);
    info!(user_id = %user.id, "user logged in");
    Ok(LoginOutcome {
        token,
        user: LoginUser {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    })
}

/// Resolve a validated token's user.
pub async fn current_user(pool: &PgPool, user_id: Uuid) -> Result<PublicUser, AuthError> {
    let user = users::get_user(pool, user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    Ok(user.into())
}
