//! Tier A: direct fragment scan.
//!
//! Finds self-contained, non-nested `{...}` blocks and pulls fields out of
//! each by label-anchored pattern matching. No JSON parsing happens here,
//! so stray commas, spacing, or garbage elsewhere in a block cannot spoil
//! the fields that do match.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::normalizer::DiscardCounts;
use crate::record::ContentRecord;
use crate::validator;

lazy_static! {
    /// A brace block whose interior contains no further braces.
    static ref OBJECT_RE: Regex = Regex::new(r"\{[^{}]*\}").unwrap();

    static ref TITLE_RE: Regex = Regex::new(r#""title":\s*"([^"]+)""#).unwrap();
    static ref YEAR_RE: Regex = Regex::new(r#""year":\s*(\d+)"#).unwrap();
    static ref CATEGORY_RE: Regex = Regex::new(r#""category":\s*"([^"]+)""#).unwrap();
    static ref EXTRA_INFO_RE: Regex = Regex::new(r#""extra_info":\s*"([^"]+)""#).unwrap();
    static ref TYPE_RE: Regex = Regex::new(r#""type":\s*"([^"]+)""#).unwrap();
    static ref RATING_RE: Regex = Regex::new(r#""rating":\s*(\d+(?:\.\d+)?)"#).unwrap();
}

/// Scan `raw` for candidate blocks and validate each independently.
///
/// Produces zero or more records; this tier cannot fail.
pub(super) fn direct_scan(raw: &str, discarded: &mut DiscardCounts) -> Vec<ContentRecord> {
    let mut records = Vec::new();

    for block in OBJECT_RE.find_iter(raw) {
        let bag = extract_fields(block.as_str());
        match validator::validate(&bag) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::debug!(%reason, "direct scan dropped block");
                discarded.scan_rejected += 1;
            }
        }
    }

    records
}

/// Locate each field by its label, independently of the others.
fn extract_fields(block: &str) -> Map<String, Value> {
    let mut bag = Map::new();

    if let Some(caps) = TITLE_RE.captures(block) {
        bag.insert("title".into(), Value::from(&caps[1]));
    }
    if let Some(caps) = YEAR_RE.captures(block) {
        if let Ok(year) = caps[1].parse::<i64>() {
            bag.insert("year".into(), Value::from(year));
        }
    }
    if let Some(caps) = CATEGORY_RE.captures(block) {
        bag.insert("category".into(), Value::from(&caps[1]));
    }
    if let Some(caps) = EXTRA_INFO_RE.captures(block) {
        bag.insert("extra_info".into(), Value::from(&caps[1]));
    }
    if let Some(caps) = TYPE_RE.captures(block) {
        bag.insert("type".into(), Value::from(&caps[1]));
    }
    if let Some(caps) = RATING_RE.captures(block) {
        if let Ok(rating) = caps[1].parse::<f64>() {
            bag.insert("rating".into(), Value::from(rating));
        }
    }

    bag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContentKind;

    #[test]
    fn test_scan_tolerates_garbage_around_fields() {
        let raw = r#"Sure! Here you go: {"title": "Movie 1", junk junk,, "year": 2023,
            "category": "Hollywood", "type": "movie", trailing garbage}"#;

        let mut discarded = DiscardCounts::default();
        let records = direct_scan(raw, &mut discarded);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Movie 1");
        assert_eq!(records[0].year, Some(2023));
        assert_eq!(records[0].kind, ContentKind::Movie);
        assert_eq!(discarded.scan_rejected, 0);
    }

    #[test]
    fn test_scan_skips_nested_blocks() {
        // The outer object nests a brace pair, so only the inner block
        // matches - and it has no usable fields.
        let raw = r#"{"title": {"nested": 1}, "category": "Anime", "type": "movie"}"#;

        let mut discarded = DiscardCounts::default();
        let records = direct_scan(raw, &mut discarded);

        assert!(records.is_empty());
        assert_eq!(discarded.scan_rejected, 1);
    }

    #[test]
    fn test_scan_counts_invalid_blocks() {
        let raw = r#"{"title":"A","category":"Korean","type":"movie"}
                     {"title":"B","category":"Hollywood","type":"movie"}"#;

        let mut discarded = DiscardCounts::default();
        let records = direct_scan(raw, &mut discarded);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "B");
        assert_eq!(discarded.scan_rejected, 1);
    }

    #[test]
    fn test_rating_with_decimals() {
        let raw = r#"{"title":"A","category":"Anime","type":"series","rating": 8.25}"#;

        let mut discarded = DiscardCounts::default();
        let records = direct_scan(raw, &mut discarded);

        assert_eq!(records[0].rating, Some(8.25));
    }
}
