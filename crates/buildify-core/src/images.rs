//! Content-addressed storage for project logos.
//!
//! Images are stored once per SHA-256 digest in `image_blobs`; projects keep
//! only the digest and the API refers to images by [`blob_path`].

use anyhow::Context;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use buildify_db::models::Project;
use buildify_db::queries::blobs;
use buildify_db::queries::projects::{self, NewProject};

use crate::datauri::DataUri;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("unknown logo image: {0}")]
    UnknownLogo(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// The logo attached to a project being saved.
#[derive(Debug, Clone, Copy)]
pub enum Logo<'a> {
    /// Freshly uploaded image bytes.
    Upload(&'a DataUri),
    /// Digest of an image that should already be stored.
    Stored(&'a str),
}

/// URL prefix under which stored images are served.
pub const BLOB_PATH_PREFIX: &str = "/api/blobs/";

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// API path of a stored image.
pub fn blob_path(digest: &str) -> String {
    format!("{BLOB_PATH_PREFIX}{digest}")
}

/// Whether `digest` has the shape of a [`content_digest`]: exactly 64
/// lowercase hex digits.
pub fn is_content_digest(digest: &str) -> bool {
    digest.len() == 64
        && digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Extract the digest from a [`blob_path`] reference.
pub fn parse_blob_path(reference: &str) -> Option<&str> {
    let digest = reference.trim().strip_prefix(BLOB_PATH_PREFIX)?;
    is_content_digest(digest).then_some(digest)
}

/// Insert a project together with its logo.
///
/// The blob write (or the check that a referenced blob exists) and the
/// project insert share one transaction, and the blob row stays locked until
/// commit, so a concurrent orphan sweep cannot remove it in between.
/// `project.logo_digest` is ignored and replaced by the logo's digest.
pub async fn save_project_with_logo(
    pool: &PgPool,
    project: &NewProject<'_>,
    logo: Option<Logo<'_>>,
) -> Result<Project, SaveError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let digest = match logo {
        None => None,
        Some(Logo::Upload(image)) => {
            let digest = content_digest(&image.bytes);
            blobs::upsert_blob(&mut *tx, &digest, &image.mime, &image.bytes).await?;
            tracing::debug!(%digest, mime = %image.mime, size = image.bytes.len(), "stored image blob");
            Some(digest)
        }
        Some(Logo::Stored(digest)) => {
            if !blobs::lock_blob(&mut *tx, digest).await? {
                return Err(SaveError::UnknownLogo(blob_path(digest)));
            }
            Some(digest.to_owned())
        }
    };

    let row = projects::insert_project(
        &mut *tx,
        &NewProject {
            logo_digest: digest.as_deref(),
            ..project.clone()
        },
    )
    .await?;

    tx.commit().await.context("failed to commit project")?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blob_path_roundtrip() {
        let digest = content_digest(b"logo");
        let path = blob_path(&digest);
        assert!(path.starts_with("/api/blobs/"));
        assert_eq!(parse_blob_path(&path), Some(digest.as_str()));
    }

    #[test]
    fn parse_blob_path_rejects_malformed() {
        assert_eq!(parse_blob_path("/api/blobs/xyz"), None);
        assert_eq!(parse_blob_path("/elsewhere/abc"), None);
        let upper = "A".repeat(64);
        assert_eq!(parse_blob_path(&format!("/api/blobs/{upper}")), None);
    }

    #[test]
    fn digest_shape() {
        assert!(is_content_digest(&content_digest(b"x")));
        assert!(!is_content_digest("abc"));
        assert!(!is_content_digest(&"g".repeat(64)));
    }
}
