//! The generation pipeline shared by the text endpoints:
//! prompt -> remote model -> sanitize -> parse (with the schema's fallback
//! policy) -> optional duplicate filter.

use thiserror::Error;
use tracing::debug;

use crate::dedupe::{self, NameLookup};
use crate::output::{self, FALLBACK_LIMIT, ModelOutput, NameList, OutputError};
use crate::prompt::{self, TextRequest};
use crate::provider::{ProviderError, TextModel};
use crate::sanitize::sanitize_model_text;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to check existing names: {0:#}")]
    Lookup(anyhow::Error),
}

/// Call `model` and parse its sanitized reply as `T`.
pub async fn generate_structured<T: ModelOutput>(
    model: &dyn TextModel,
    request: &TextRequest,
) -> Result<T, GenerateError> {
    let raw = model.generate(request).await?;
    let clean = sanitize_model_text(&raw);
    debug!(model = model.name(), kind = T::KIND, chars = clean.len(), "model replied");
    Ok(output::parse_model_output(&clean)?)
}

/// Call `model` and return its reply, trimmed, as free text.
pub async fn generate_text(
    model: &dyn TextModel,
    request: &TextRequest,
) -> Result<String, GenerateError> {
    let raw = model.generate(request).await?;
    Ok(raw.trim().to_owned())
}

/// Generate business names for `description` and drop the ones already used
/// by a saved project.
pub async fn generate_available_names(
    model: &dyn TextModel,
    lookup: &dyn NameLookup,
    description: &str,
) -> Result<Vec<String>, GenerateError> {
    let NameList { names } =
        generate_structured::<NameList>(model, &prompt::names_prompt(description)).await?;
    dedupe::available_names(lookup, names, FALLBACK_LIMIT)
        .await
        .map_err(GenerateError::Lookup)
}
