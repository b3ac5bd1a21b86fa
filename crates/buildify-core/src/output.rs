//! Structured model output: schemas, schema checks, and the fallback policy
//! applied when the model does not return JSON.
//!
//! Every schema goes through [`parse_model_output`]:
//!
//! 1. Text that decodes as JSON is deserialized into the schema and then
//!    checked ([`ModelOutput::check`]). Failing either step is an
//!    [`OutputError::Schema`], whatever the policy.
//! 2. Text that is not JSON is an [`OutputError::Syntax`] for
//!    [`FallbackPolicy::Strict`] schemas. [`FallbackPolicy::Delimited`]
//!    schemas instead split the text on their delimiter, trim the pieces,
//!    drop empty ones, and keep at most `limit`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// What to do when model text is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Surface the parse failure.
    Strict,
    /// Treat the text as a `delimiter`-separated list of at most `limit`
    /// items.
    Delimited { delimiter: char, limit: usize },
}

/// Maximum number of items kept by a delimited fallback.
pub const FALLBACK_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("{kind} output is not valid JSON: {source}")]
    Syntax {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} output does not match the expected schema: {reason}")]
    Schema { kind: &'static str, reason: String },

    #[error("{kind} output contained no usable items")]
    EmptyFallback { kind: &'static str },
}

/// A JSON shape the text model is asked to produce.
pub trait ModelOutput: DeserializeOwned + Sized {
    /// Short label used in errors and logs.
    const KIND: &'static str;
    const FALLBACK: FallbackPolicy;

    /// Validate a successfully deserialized value.
    fn check(&self) -> Result<(), String>;

    /// Build a value from the items of a delimited fallback. Only called for
    /// schemas with a [`FallbackPolicy::Delimited`] policy.
    fn from_items(items: Vec<String>) -> Option<Self> {
        let _ = items;
        None
    }
}

/// Parse sanitized model text into `T` under `T`'s fallback policy.
pub fn parse_model_output<T: ModelOutput>(text: &str) -> Result<T, OutputError> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(source) => return fallback(text, source),
    };

    let parsed: T = serde_json::from_value(value).map_err(|e| OutputError::Schema {
        kind: T::KIND,
        reason: e.to_string(),
    })?;
    parsed.check().map_err(|reason| OutputError::Schema {
        kind: T::KIND,
        reason,
    })?;
    Ok(parsed)
}

fn fallback<T: ModelOutput>(text: &str, source: serde_json::Error) -> Result<T, OutputError> {
    let FallbackPolicy::Delimited { delimiter, limit } = T::FALLBACK else {
        return Err(OutputError::Syntax {
            kind: T::KIND,
            source,
        });
    };

    let items = split_delimited(text, delimiter, limit);
    if items.is_empty() {
        return Err(OutputError::EmptyFallback { kind: T::KIND });
    }
    warn!(
        kind = T::KIND,
        error = %source,
        items = items.len(),
        "model output was not JSON; using delimited fallback"
    );
    T::from_items(items).ok_or(OutputError::Syntax {
        kind: T::KIND,
        source,
    })
}

/// Split on `delimiter`, trim each piece, drop empty pieces, keep `limit`.
pub fn split_delimited(text: &str, delimiter: char, limit: usize) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_owned)
        .collect()
}

fn check_items(field: &str, items: &[String]) -> Result<(), String> {
    if items.is_empty() {
        return Err(format!("`{field}` is empty"));
    }
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(format!("`{field}` contains a blank entry"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// `{ "names": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameList {
    pub names: Vec<String>,
}

impl ModelOutput for NameList {
    const KIND: &'static str = "names";
    const FALLBACK: FallbackPolicy = FallbackPolicy::Delimited {
        delimiter: ',',
        limit: FALLBACK_LIMIT,
    };

    fn check(&self) -> Result<(), String> {
        check_items("names", &self.names)
    }

    fn from_items(items: Vec<String>) -> Option<Self> {
        Some(Self { names: items })
    }
}

/// `{ "slogans": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SloganList {
    pub slogans: Vec<String>,
}

impl ModelOutput for SloganList {
    const KIND: &'static str = "slogans";
    const FALLBACK: FallbackPolicy = FallbackPolicy::Delimited {
        delimiter: '|',
        limit: FALLBACK_LIMIT,
    };

    fn check(&self) -> Result<(), String> {
        check_items("slogans", &self.slogans)
    }

    fn from_items(items: Vec<String>) -> Option<Self> {
        Some(Self { slogans: items })
    }
}

/// Market validation of a business idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Viability from 0 to 100. Must be a JSON integer.
    pub score: u32,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verdict: String,
}

impl ModelOutput for MarketAnalysis {
    const KIND: &'static str = "analysis";
    const FALLBACK: FallbackPolicy = FallbackPolicy::Strict;

    fn check(&self) -> Result<(), String> {
        if self.score > 100 {
            return Err(format!("`score` {} is above 100", self.score));
        }
        if self.verdict.trim().is_empty() {
            return Err("`verdict` is empty".to_owned());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typography {
    pub primary: String,
    pub secondary: String,
}

/// A website design system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSystem {
    pub color_palette: Vec<ColorSwatch>,
    pub typography: Typography,
    pub button_style: String,
    pub layout_vibe: String,
    pub components: Vec<String>,
}

impl ModelOutput for DesignSystem {
    const KIND: &'static str = "design";
    const FALLBACK: FallbackPolicy = FallbackPolicy::Strict;

    fn check(&self) -> Result<(), String> {
        if self.color_palette.is_empty() {
            return Err("`colorPalette` is empty".to_owned());
        }
        if let Some(bad) = self.color_palette.iter().find(|c| !c.code.starts_with('#')) {
            return Err(format!("color code {:?} does not start with '#'", bad.code));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_json_is_returned_as_is() {
        let parsed: NameList =
            parse_model_output(r#"{"names":["Vixal","Qore","Luminary"]}"#).unwrap();
        assert_eq!(parsed.names, vec!["Vixal", "Qore", "Luminary"]);
    }

    #[test]
    fn names_fallback_splits_trims_and_truncates() {
        let parsed: NameList =
            parse_model_output("Zylo, Plura, Vexel, Stratos, Qubix, Extra").unwrap();
        assert_eq!(parsed.names, vec!["Zylo", "Plura", "Vexel", "Stratos", "Qubix"]);
    }

    #[test]
    fn names_fallback_drops_empty_segments() {
        let parsed: NameList = parse_model_output("Zylo,, ,Plura,").unwrap();
        assert_eq!(parsed.names, vec!["Zylo", "Plura"]);
    }

    #[test]
    fn names_fallback_with_nothing_usable_fails() {
        let err = parse_model_output::<NameList>(" , , ").unwrap_err();
        assert!(matches!(err, OutputError::EmptyFallback { kind: "names" }));
    }

    #[test]
    fn names_wrong_json_shape_is_schema_error_not_fallback() {
        let err = parse_model_output::<NameList>(r#"{"brands":["A","B"]}"#).unwrap_err();
        assert!(matches!(err, OutputError::Schema { kind: "names", .. }), "{err}");
    }

    #[test]
    fn names_empty_list_is_schema_error() {
        let err = parse_model_output::<NameList>(r#"{"names":[]}"#).unwrap_err();
        assert!(matches!(err, OutputError::Schema { .. }));
    }

    #[test]
    fn slogans_fallback_uses_pipe() {
        let parsed: SloganList =
            parse_model_output("Brew bold | Sip, savor, repeat | Wake up happy").unwrap();
        assert_eq!(
            parsed.slogans,
            vec!["Brew bold", "Sip, savor, repeat", "Wake up happy"]
        );
    }

    #[test]
    fn analysis_strict_keeps_integer_score() {
        let parsed: MarketAnalysis =
            parse_model_output(r#"{"score":85,"pros":["a"],"cons":["b"],"verdict":"ok"}"#)
                .unwrap();
        assert_eq!(parsed.score, 85);
        assert_eq!(parsed.pros, vec!["a"]);
        assert_eq!(parsed.cons, vec!["b"]);
        assert_eq!(parsed.verdict, "ok");
    }

    #[test]
    fn analysis_string_score_is_not_coerced() {
        let err = parse_model_output::<MarketAnalysis>(
            r#"{"score":"85","pros":[],"cons":[],"verdict":"ok"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, OutputError::Schema { kind: "analysis", .. }));
    }

    #[test]
    fn analysis_score_out_of_range() {
        let err = parse_model_output::<MarketAnalysis>(
            r#"{"score":140,"pros":[],"cons":[],"verdict":"great"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("above 100"), "{err}");
    }

    #[test]
    fn analysis_non_json_fails_loudly() {
        let err = parse_model_output::<MarketAnalysis>("Score: 85, looks good").unwrap_err();
        assert!(matches!(err, OutputError::Syntax { kind: "analysis", .. }));
    }

    #[test]
    fn design_system_parses_camel_case() {
        let text = r##"{
            "colorPalette": [{"code": "#1A1A1A", "name": "Primary Black"}],
            "typography": {"primary": "Inter", "secondary": "Merriweather"},
            "buttonStyle": "Rounded",
            "layoutVibe": "Clean",
            "components": ["Hero Section"],
            "extra": true
        }"##;
        let parsed: DesignSystem = parse_model_output(text).unwrap();
        assert_eq!(parsed.typography.primary, "Inter");
        assert_eq!(parsed.color_palette[0].name, "Primary Black");

        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("colorPalette").is_some());
        assert!(json.get("buttonStyle").is_some());
    }

    #[test]
    fn design_system_rejects_bad_color_code() {
        let text = r#"{
            "colorPalette": [{"code": "black", "name": "Black"}],
            "typography": {"primary": "Inter", "secondary": "Lora"},
            "buttonStyle": "Flat",
            "layoutVibe": "Bold",
            "components": []
        }"#;
        let err = parse_model_output::<DesignSystem>(text).unwrap_err();
        assert!(matches!(err, OutputError::Schema { kind: "design", .. }));
    }

    #[test]
    fn split_delimited_respects_limit() {
        assert_eq!(split_delimited("a|b|c", '|', 2), vec!["a", "b"]);
    }
}
