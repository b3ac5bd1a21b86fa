//! Prompt construction for the text and image models.
//!
//! Pure string assembly: user-supplied fields are embedded verbatim inside
//! double quotes. Nothing here performs I/O.

use serde::Serialize;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation sent to a text model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Everything a [`crate::provider::TextModel`] needs for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub turns: Vec<Turn>,
}

impl TextRequest {
    /// A request consisting of a single user prompt.
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(prompt)],
        }
    }
}

/// Number of names requested from the model.
pub const NAMES_REQUESTED: usize = 10;
/// Number of slogans requested from the model.
pub const SLOGANS_REQUESTED: usize = 5;

/// The model's canned reply that closes the consultant priming turn.
pub const CONSULTANT_ACK: &str = "Understood. I am ready to help you build your business.";

pub fn names_prompt(description: &str) -> TextRequest {
    TextRequest::single(format!(
        "Act as a creative branding expert.\n\
         Generate {NAMES_REQUESTED} unique, modern business names for: \"{description}\".\n\
         Rules:\n\
         1. Avoid generic names.\n\
         2. Prefer short, punchy, coined words.\n\
         3. Return ONLY a JSON object with a \"names\" array.\n\
         Example: {{ \"names\": [\"Vixal\", \"Qore\", \"Luminary\"] }}"
    ))
}

pub fn slogans_prompt(description: &str) -> TextRequest {
    TextRequest::single(format!(
        "Generate {SLOGANS_REQUESTED} catchy slogans for: \"{description}\".\n\
         Return ONLY JSON: {{ \"slogans\": [\"Slogan 1\", \"Slogan 2\"] }}\n\
         If you cannot produce JSON, separate the slogans with a \"|\" character."
    ))
}

pub fn validation_prompt(idea: &str, industry: &str) -> TextRequest {
    TextRequest::single(format!(
        "Analyze this startup idea: \"{idea}\" in the \"{industry}\" industry.\n\
         Return PURE JSON with this structure:\n\
         {{\n  \
           \"score\": 85,\n  \
           \"pros\": [\"Pro 1\", \"Pro 2\"],\n  \
           \"cons\": [\"Con 1\", \"Con 2\"],\n  \
           \"verdict\": \"A short summary of viability.\"\n\
         }}\n\
         The score is an integer from 0 to 100."
    ))
}

pub fn design_prompt(description: &str) -> TextRequest {
    TextRequest::single(format!(
        "Create a UI Design System for a website about: \"{description}\".\n\
         Return ONLY valid JSON. Do NOT use markdown.\n\
         Structure:\n\
         {{\n  \
           \"colorPalette\": [\n    \
             {{ \"code\": \"#1A1A1A\", \"name\": \"Primary Black\" }},\n    \
             {{ \"code\": \"#FF5733\", \"name\": \"Accent Orange\" }},\n    \
             {{ \"code\": \"#F5F5F5\", \"name\": \"Off White\" }},\n    \
             {{ \"code\": \"#333333\", \"name\": \"Dark Grey\" }}\n  \
           ],\n  \
           \"typography\": {{ \"primary\": \"Inter\", \"secondary\": \"Merriweather\" }},\n  \
           \"buttonStyle\": \"Rounded corners with drop shadow\",\n  \
           \"layoutVibe\": \"Clean, Minimalist, and Professional\",\n  \
           \"components\": [\"Hero Section\", \"Feature Grid\", \"Testimonial Slider\"]\n\
         }}"
    ))
}

/// A consultant conversation: priming turn with `context`, the fixed
/// acknowledgement, then the user's `message`.
pub fn chat_conversation(context: &str, message: &str) -> TextRequest {
    TextRequest {
        turns: vec![
            Turn::user(format!(
                "You are a helpful business consultant. Context: {context}"
            )),
            Turn::model(CONSULTANT_ACK),
            Turn::user(message),
        ],
    }
}

pub fn logo_prompt(description: &str) -> String {
    format!(
        "A modern, professional, minimalist vector logo for a business described as: \
         \"{description}\". High quality, white background, flat design."
    )
}

pub fn studio_prompt(prompt: &str) -> String {
    format!("High quality, professional image, {prompt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_text(req: &TextRequest) -> &str {
        assert_eq!(req.turns.len(), 1);
        assert_eq!(req.turns[0].role, Role::User);
        &req.turns[0].text
    }

    #[test]
    fn names_prompt_quotes_description_and_asks_for_json() {
        let req = names_prompt("eco-friendly dog treats");
        let text = only_text(&req);
        assert!(text.contains("\"eco-friendly dog treats\""));
        assert!(text.contains("Generate 10 unique"));
        assert!(text.contains("\"names\" array"));
    }

    #[test]
    fn slogans_prompt_mentions_pipe_separator() {
        let req = slogans_prompt("bakery");
        let text = only_text(&req);
        assert!(text.contains("\"slogans\""));
        assert!(text.contains('|'));
    }

    #[test]
    fn validation_prompt_includes_idea_and_industry() {
        let req = validation_prompt("drone pizza", "food delivery");
        let text = only_text(&req);
        assert!(text.contains("\"drone pizza\""));
        assert!(text.contains("\"food delivery\" industry"));
        assert!(text.contains("\"verdict\""));
    }

    #[test]
    fn design_prompt_forbids_markdown() {
        let text = only_text(&design_prompt("yoga studio")).to_owned();
        assert!(text.contains("Do NOT use markdown"));
        assert!(text.contains("\"colorPalette\""));
    }

    #[test]
    fn chat_conversation_has_priming_ack_and_message() {
        let req = chat_conversation("selling candles online", "How do I price?");
        assert_eq!(req.turns.len(), 3);
        assert_eq!(req.turns[0].role, Role::User);
        assert!(req.turns[0].text.ends_with("Context: selling candles online"));
        assert_eq!(req.turns[1], Turn::model(CONSULTANT_ACK));
        assert_eq!(req.turns[2], Turn::user("How do I price?"));
    }

    #[test]
    fn image_prompts() {
        assert!(logo_prompt("tea shop").contains("\"tea shop\""));
        assert_eq!(
            studio_prompt("a red bicycle"),
            "High quality, professional image, a red bicycle"
        );
    }
}
