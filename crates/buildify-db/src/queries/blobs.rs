//! Database query functions for the content-addressed `image_blobs` table.
//!
//! Writers that attach a blob to a project run [`upsert_blob`] or
//! [`lock_blob`] inside the same transaction as the project insert. Both
//! leave the blob row locked until commit, and the orphan sweep in
//! [`crate::queries::projects::delete_projects_for_user`] skips locked rows.

use anyhow::{Context, Result};
use sqlx::PgExecutor;

use crate::models::ImageBlob;

/// Store a blob under its digest and lock the row. A blob with the same
/// digest is left as is.
pub async fn upsert_blob(
    executor: impl PgExecutor<'_>,
    digest: &str,
    mime: &str,
    data: &[u8],
) -> Result<()> {
    // The no-op update takes the row lock even when the digest exists.
    sqlx::query(
        "INSERT INTO image_blobs (digest, mime, data) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (digest) DO UPDATE SET mime = image_blobs.mime",
    )
    .bind(digest)
    .bind(mime)
    .bind(data)
    .execute(executor)
    .await
    .context("failed to store image blob")?;

    Ok(())
}

/// Lock an existing blob against deletion for the rest of the transaction.
/// Returns `false` if no blob has this digest.
pub async fn lock_blob(executor: impl PgExecutor<'_>, digest: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT digest FROM image_blobs WHERE digest = $1 FOR KEY SHARE")
            .bind(digest)
            .fetch_optional(executor)
            .await
            .context("failed to lock image blob")?;

    Ok(row.is_some())
}

/// Fetch a blob by digest.
pub async fn get_blob(executor: impl PgExecutor<'_>, digest: &str) -> Result<Option<ImageBlob>> {
    let blob = sqlx::query_as::<_, ImageBlob>("SELECT * FROM image_blobs WHERE digest = $1")
        .bind(digest)
        .fetch_optional(executor)
        .await
        .context("failed to fetch image blob")?;

    Ok(blob)
}
