use serde_json::Value;

/// Model output often arrives wrapped in a markdown fence (```json ... ```).
/// Returns the inner text, or the trimmed input when no fence is present.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The opening fence may carry a language tag up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub(crate) fn parse_json(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_passes_through() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"summary\": \"x\"}\n```\n";
        assert_eq!(parse_json(raw).expect("parsed"), json!({"summary": "x"}));
    }

    #[test]
    fn fence_without_language_tag_is_unwrapped() {
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_json("{not json").is_err());
    }
}
