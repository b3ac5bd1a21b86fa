//! `data:` URIs carrying base64-encoded images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,

    #[error("data URI has no ',' separating header and payload")]
    MissingPayload,

    #[error("only base64 data URIs are supported")]
    NotBase64,

    #[error("data URI media type {0:?} is not an image")]
    NotImage(String),

    #[error("image type {0:?} is not supported; use PNG, JPEG, WebP or GIF")]
    UnsupportedImage(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Raster formats accepted for stored images. Anything that can carry
/// script, such as SVG, is refused.
pub const RASTER_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 raster image data URI.
pub fn parse(uri: &str) -> Result<DataUri, DataUriError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUriError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(DataUriError::NotBase64)?
        .trim()
        .to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(DataUriError::NotImage(mime));
    }
    if !RASTER_MIME_TYPES.contains(&mime.as_str()) {
        return Err(DataUriError::UnsupportedImage(mime));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;
    Ok(DataUri { mime, bytes })
}
