//! The content record data model.
//!
//! A [`ContentRecord`] is the unit the whole pipeline exists to produce:
//! one movie or series entry recovered from provider output. Records are
//! identified by their natural key, the (title, kind) pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a record describes a movie or a series.
///
/// Serialized as `"movie"` / `"series"`, matching the wire schema the
/// extraction prompt asks providers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    /// Parse the exact wire form. Anything other than `"movie"` or
    /// `"series"` is rejected - no case folding, no aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "series" => Some(Self::Series),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated content entry.
///
/// `year`, `rating` and `source_url` are genuinely optional - absence is
/// modeled, never a null sentinel. Timestamps are owned by the store, not
/// by the pipeline: a `ContentRecord` carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,

    #[serde(rename = "type")]
    pub kind: ContentKind,

    pub category: String,

    /// Free-form annotation ("Episode 15-18 Added", "Complete", ...).
    /// Defaults to empty when the source omitted it.
    #[serde(default)]
    pub extra_info: String,

    /// Release year; only meaningful for movies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Documented upstream as a 1-10 scale but deliberately not
    /// range-validated; only parseability is enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Provenance: which source page this record was extracted from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ContentRecord {
    /// The (title, kind) pair that uniquely identifies a record in storage.
    pub fn natural_key(&self) -> (&str, ContentKind) {
        (&self.title, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_is_exact() {
        assert_eq!(ContentKind::parse("movie"), Some(ContentKind::Movie));
        assert_eq!(ContentKind::parse("series"), Some(ContentKind::Series));
        assert_eq!(ContentKind::parse("Movie"), None);
        assert_eq!(ContentKind::parse("tv"), None);
        assert_eq!(ContentKind::parse(""), None);
    }

    #[test]
    fn test_record_serde_wire_shape() {
        let record = ContentRecord {
            title: "Movie 1".to_string(),
            kind: ContentKind::Movie,
            category: "Hollywood".to_string(),
            extra_info: "Action".to_string(),
            year: Some(2023),
            rating: None,
            source_url: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "movie");
        assert_eq!(json["year"], 2023);
        assert!(json.get("rating").is_none());
    }
}
