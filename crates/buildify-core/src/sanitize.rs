//! Cleanup of raw model text before it is parsed.

/// Markdown code-fence marker.
const FENCE: &str = "```";

/// Opening fence of a JSON block, removed wherever it appears.
const JSON_FENCE: &str = "```json";

/// Strip code fences and surrounding whitespace from model output.
///
/// Removes a leading fence together with its format tag (```` ```json ````,
/// or any tag that ends the line) and a trailing fence. Any ```` ```json ````
/// or bare fence left anywhere in the text is removed too. The result never contains ```` ``` ````, so
/// applying this twice is the same as applying it once.
pub fn sanitize_model_text(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = strip_format_tag(rest);
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    // Removing fences can expose whitespace on either side.
    text.replace(JSON_FENCE, "")
        .replace(FENCE, "")
        .trim()
        .to_owned()
}

/// Drop the info string that follows an opening fence.
///
/// `json` is always dropped; any other word only when a line break follows
/// it, so a fenced one-liner such as ```` ```Zylo, Plura``` ```` keeps its
/// first word.
fn strip_format_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'))
        .unwrap_or(rest.len());
    if tag_len == 0 {
        return rest;
    }
    let (tag, after) = rest.split_at(tag_len);
    let ends_line = after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n");
    if tag.eq_ignore_ascii_case("json") || ends_line {
        after
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{ \"names\": [\"Zylo\"] }\n```";
        assert_eq!(sanitize_model_text(raw), "{ \"names\": [\"Zylo\"] }");
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        let raw = "  \n```\n{\"a\":1}\n```  \n";
        assert_eq!(sanitize_model_text(raw), "{\"a\":1}");
    }

    #[test]
    fn strips_uppercase_json_tag_on_same_line() {
        assert_eq!(sanitize_model_text("```JSON {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn strips_other_tag_when_it_ends_the_line() {
        assert_eq!(sanitize_model_text("```text\nZylo, Plura\n```"), "Zylo, Plura");
    }

    #[test]
    fn keeps_first_word_of_fenced_one_liner() {
        assert_eq!(sanitize_model_text("```Zylo, Plura```"), "Zylo, Plura");
    }

    #[test]
    fn removes_inner_fences() {
        let raw = "Here you go:\n```json\n{\"a\":1}\n```\nEnjoy";
        let clean = sanitize_model_text(raw);
        assert!(!clean.contains(FENCE));
        assert_eq!(clean, "Here you go:\n\n{\"a\":1}\n\nEnjoy");
    }

    #[test]
    fn clean_text_is_unchanged() {
        let clean = "{\"score\":85}";
        assert_eq!(sanitize_model_text(clean), clean);
    }

    #[test]
    fn idempotent_and_fence_free() {
        let samples = [
            "```json\n{\"names\":[\"A\",\"B\"]}\n```",
            "```\nplain\n```",
            "````json\n{}\n````",
            "``````",
            "``\n```json\n`",
            "a ````json b ```json c",
            "  ```yaml\nkey: value\n```  ",
            "no fences at all",
            "```",
            "",
        ];
        for raw in samples {
            let once = sanitize_model_text(raw);
            let twice = sanitize_model_text(&once);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
            assert!(!once.contains(FENCE), "fence left in {once:?} from {raw:?}");
        }
    }
}
