//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{SubscriptionPlan, User};

/// Profile fields a user may change from the settings page.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate<'a> {
    pub notifications: Option<bool>,
    pub two_factor: Option<bool>,
    pub username: Option<&'a str>,
}

/// Insert a new user row. Plan and settings take their column defaults.
///
/// Fails with a unique violation (see [`crate::is_unique_violation`]) if the
/// email or username is already taken.
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .context("failed to insert user")?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by email (exact match).
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Apply a settings update. Returns the updated row, or `None` if no user
/// has this ID.
pub async fn update_settings(
    pool: &PgPool,
    id: Uuid,
    update: &SettingsUpdate<'_>,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users \
         SET notifications = COALESCE($2, notifications), \
             two_factor = COALESCE($3, two_factor), \
             username = COALESCE($4, username) \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(update.notifications)
    .bind(update.two_factor)
    .bind(update.username)
    .fetch_optional(pool)
    .await
    .context("failed to update user settings")?;

    Ok(user)
}

/// Set the subscription plan. Returns the updated row, or `None` if no user
/// has this ID.
pub async fn update_plan(
    pool: &PgPool,
    id: Uuid,
    plan: SubscriptionPlan,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET plan = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(plan)
    .fetch_optional(pool)
    .await
    .context("failed to update user plan")?;

    Ok(user)
}
