//! Remote model invocation.
//!
//! [`TextModel`] and [`ImageModel`] are the seams between route handlers and
//! the third-party AI services. The concrete clients ([`GeminiClient`],
//! [`HuggingFaceClient`]) are built once at startup and shared behind an
//! `Arc`; tests substitute in-process fakes.

mod gemini;
mod huggingface;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;

use async_trait::async_trait;

use crate::prompt::TextRequest;

/// Longest provider error body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Errors from a remote model call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a response without content")]
    EmptyResponse { provider: &'static str },

    #[error("could not decode {provider} response: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },
}

/// An image returned by an [`ImageModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A text-generation model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Provider/model label for logs.
    fn name(&self) -> &str;

    /// Run one generation and return the raw text of the reply.
    async fn generate(&self, request: &TextRequest) -> Result<String, ProviderError>;
}

/// An image-generation model.
#[async_trait]
pub trait ImageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError>;
}

/// Shorten an error body to at most [`MAX_ERROR_BODY`] characters.
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

// Compile-time assertion: both traits must stay object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextModel, _: &dyn ImageModel) {}
};


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_short_is_unchanged() {
        assert_eq!(truncate_body("  quota exceeded \n"), "quota exceeded");
    }

    #[test]
    fn truncate_body_long_is_cut_on_char_boundary() {
        let long = "é".repeat(MAX_ERROR_BODY + 10);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY + 3);
    }
}
