//! Database query functions for the `projects` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Project;

/// Fields for a new project row.
#[derive(Debug, Clone)]
pub struct NewProject<'a> {
    pub user_id: Uuid,
    pub description: &'a str,
    pub business_name: &'a str,
    pub slogan: Option<&'a str>,
    /// Digest of a blob already present in `image_blobs`.
    pub logo_digest: Option<&'a str>,
}

/// Insert a project. Fails with a foreign-key violation if `user_id` or
/// `logo_digest` does not exist.
pub async fn insert_project(
    executor: impl PgExecutor<'_>,
    new: &NewProject<'_>,
) -> Result<Project> {
    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (user_id, description, business_name, slogan, logo_digest) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.description)
    .bind(new.business_name)
    .bind(new.slogan)
    .bind(new.logo_digest)
    .fetch_one(executor)
    .await
    .context("failed to insert project")?;

    Ok(project)
}

/// List a user's projects, newest first.
pub async fn list_projects_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list projects")?;

    Ok(projects)
}

/// Delete every project owned by `user_id`, then any blob those projects
/// referenced that nothing references any more. Blobs locked by a save in
/// progress are skipped. Returns the number of projects deleted.
pub async fn delete_projects_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let freed: Vec<(Option<String>,)> =
        sqlx::query_as("DELETE FROM projects WHERE user_id = $1 RETURNING logo_digest")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .context("failed to delete projects")?;
    let deleted = freed.len() as u64;

    let mut digests: Vec<String> = freed.into_iter().filter_map(|(d,)| d).collect();
    digests.sort_unstable();
    digests.dedup();

    let orphans = if digests.is_empty() {
        0
    } else {
        sqlx::query(
            "DELETE FROM image_blobs b \
             WHERE b.digest IN ( \
                 SELECT digest FROM image_blobs \
                 WHERE digest = ANY($1) \
                 FOR UPDATE SKIP LOCKED \
             ) \
             AND NOT EXISTS (SELECT 1 FROM projects p WHERE p.logo_digest = b.digest)",
        )
        .bind(&digests)
        .execute(&mut *tx)
        .await
        .context("failed to delete orphaned image blobs")?
        .rows_affected()
    };

    tx.commit().await.context("failed to commit project deletion")?;

    tracing::debug!(%user_id, deleted, orphans, "deleted user projects");
    Ok(deleted)
}

/// Return the subset of `candidates` already used as a business name by any
/// project, across all users.
pub async fn find_existing_business_names(
    pool: &PgPool,
    candidates: &[String],
) -> Result<Vec<String>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT business_name FROM projects WHERE business_name = ANY($1)",
    )
    .bind(candidates)
    .fetch_all(pool)
    .await
    .context("failed to look up existing business names")?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}
