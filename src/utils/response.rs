// file: src/utils/response.rs
// description: cleanup of raw model output before structural parsing
// reference: models wrap JSON in markdown fences despite prompt instructions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPENING_FENCE: Regex = Regex::new(r"^\s*```(?:json)?\s*").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"\s*```\s*$").unwrap();
}

/// Strip a surrounding markdown code fence, if any, and trim whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    let without_opening = OPENING_FENCE.replace(raw, "");
    let without_closing = CLOSING_FENCE.replace(&without_opening, "");
    without_closing.trim().to_string()
}

/// Normalize a short free-text label: strip quotes and surrounding whitespace.
pub fn clean_label(raw: &str) -> String {
    raw.trim().replace(['"', '\''], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let raw = "```json\n[{\"title\": \"Late penalty\"}]\n```";
        assert_eq!(strip_code_fences(raw), "[{\"title\": \"Late penalty\"}]");
    }

    #[test]
    fn test_strip_bare_fence() {
        let raw = "```\n[]\n```";
        assert_eq!(strip_code_fences(raw), "[]");
    }

    #[test]
    fn test_unfenced_passthrough() {
        let raw = "  [1, 2, 3]  ";
        assert_eq!(strip_code_fences(raw), "[1, 2, 3]");
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("  \"Employment Contract\"\n"), "Employment Contract");
        assert_eq!(clean_label("'Lease'"), "Lease");
    }
}
