//! Tier B: bracket/array recovery.
//!
//! Isolates the JSON-array slice of a response and applies a fixed sequence
//! of textual repairs before attempting a real parse. A failed parse gets
//! exactly one retry after a narrower second repair pass; if that fails too,
//! the repaired slice is handed to Tier C.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    /// `"name" :` with a stray space before the colon.
    static ref SPACED_COLON_RE: Regex = Regex::new(r#""([^"]+)" :"#).unwrap();

    /// A bare scalar value (not quoted, not numeric, not a container)
    /// terminated by a comma.
    static ref BARE_VALUE_COMMA_RE: Regex =
        Regex::new(r#": *([^"{}\[\],\d][^{}\[\],\s]*),"#).unwrap();

    /// Same, at the very end of the slice.
    static ref BARE_VALUE_END_RE: Regex =
        Regex::new(r#": *([^"{}\[\],\d][^{}\[\],\s]*)$"#).unwrap();

    static ref CONTROL_CHAR_RE: Regex = Regex::new(r"[\x00-\x1F\x7F]").unwrap();
    static ref TRAILING_COMMA_OBJ_RE: Regex = Regex::new(r",\s*\}").unwrap();
    static ref TRAILING_COMMA_ARR_RE: Regex = Regex::new(r",\s*\]").unwrap();
}

/// Outcome of the array recovery attempt.
pub(super) enum Recovery {
    /// No bracketed payload was found at all; the pipeline yields empty
    /// without involving Tier C.
    NoPayload,

    /// The (possibly repaired) slice parsed as an array of field bags.
    Parsed(Vec<Map<String, Value>>),

    /// Both parse attempts failed; Tier C gets the repaired slice.
    Unparsed(String),
}

pub(super) fn array_recovery(raw: &str) -> Recovery {
    let defenced = strip_code_fences(raw);

    let Some(slice) = isolate_payload(&defenced) else {
        tracing::debug!("no bracketed payload in response");
        return Recovery::NoPayload;
    };

    let repaired = apply_repairs(&slice);
    if let Ok(bags) = parse_bags(&repaired) {
        return Recovery::Parsed(bags);
    }

    // One retry after the narrower second pass, then give up.
    let second = second_pass(&repaired);
    match parse_bags(&second) {
        Ok(bags) => Recovery::Parsed(bags),
        Err(err) => {
            tracing::debug!(%err, "array slice unparseable after repairs");
            Recovery::Unparsed(second)
        }
    }
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Isolate the first `[` .. last `]` slice; failing that, wrap a lone
/// `{..}` object as a one-element array.
fn isolate_payload(text: &str) -> Option<String> {
    if let Some(start) = text.find('[') {
        match text.rfind(']') {
            Some(end) if end > start => return Some(text[start..=end].to_string()),
            _ => return None,
        }
    }

    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(format!("[{}]", &text[start..=end])),
        _ => None,
    }
}

/// The fixed first-pass repair sequence, applied in order.
fn apply_repairs(slice: &str) -> String {
    let mut s = slice.replace('`', "");
    s = SPACED_COLON_RE.replace_all(&s, "\"$1\":").into_owned();
    s = BARE_VALUE_COMMA_RE.replace_all(&s, ":\"$1\",").into_owned();
    s = BARE_VALUE_END_RE.replace_all(&s, ":\"$1\"").into_owned();
    s = s.replace("\\\"", "\"");
    s = CONTROL_CHAR_RE.replace_all(&s, "").into_owned();
    s = TRAILING_COMMA_OBJ_RE.replace_all(&s, "}").into_owned();
    TRAILING_COMMA_ARR_RE.replace_all(&s, "]").into_owned()
}

/// Narrower fixes tried once when the first parse fails.
fn second_pass(slice: &str) -> String {
    slice
        .replace("\"\"", "\"")
        .replace("''", "'")
        .replace('\u{2026}', "...")
}

fn parse_bags(slice: &str) -> Result<Vec<Map<String, Value>>, serde_json::Error> {
    serde_json::from_str(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Vec<Map<String, Value>> {
        match array_recovery(raw) {
            Recovery::Parsed(bags) => bags,
            Recovery::NoPayload => panic!("no payload for {raw:?}"),
            Recovery::Unparsed(s) => panic!("unparsed: {s:?}"),
        }
    }

    #[test]
    fn test_fenced_array_with_trailing_comma() {
        let raw = "```json\n[{\"title\":\"X\",\"category\":\"Foreign\",\"type\":\"series\",}]\n```";
        let bags = parsed(raw);
        assert_eq!(bags.len(), 1);
        assert_eq!(bags[0]["title"], "X");
    }

    #[test]
    fn test_single_object_wrapped_as_array() {
        let raw = r#"{"title":"Y","category":"Anime","type":"movie"}"#;
        let bags = parsed(raw);
        assert_eq!(bags.len(), 1);
        assert_eq!(bags[0]["title"], "Y");
    }

    #[test]
    fn test_spaced_colon_and_backticks_repaired() {
        let raw = "[{\"title\" : \"X\", \"category\": `Anime`, \"type\": \"movie\"}]";
        // Backticks are stripped, leaving a bare value that gets quoted.
        let bags = parsed(raw);
        assert_eq!(bags[0]["title"], "X");
        assert_eq!(bags[0]["category"], "Anime");
    }

    #[test]
    fn test_bare_scalar_values_get_quoted() {
        let raw = r#"[{"title":"X","category": Hollywood,"type":"movie"}]"#;
        let bags = parsed(raw);
        assert_eq!(bags[0]["category"], "Hollywood");
    }

    #[test]
    fn test_no_payload_at_all() {
        assert!(matches!(
            array_recovery("the model refused to answer"),
            Recovery::NoPayload
        ));
    }

    #[test]
    fn test_unbalanced_brackets_yield_no_payload() {
        assert!(matches!(
            array_recovery("[{\"title\":\"X\""),
            Recovery::NoPayload
        ));
    }

    #[test]
    fn test_hopeless_slice_is_handed_to_tier_c() {
        let raw = r#"[{"title": {"bad"},"category":"Hollywood","type":"movie"}]"#;
        assert!(matches!(array_recovery(raw), Recovery::Unparsed(_)));
    }

    #[test]
    fn test_doubled_quotes_fixed_on_second_pass() {
        // First pass leaves the doubled quotes, second pass collapses them.
        let raw = "[{\"title\":\"\"X\"\",\"category\":\"Anime\",\"type\":\"movie\"}]";
        let bags = parsed(raw);
        assert_eq!(bags[0]["title"], "X");
    }
}
