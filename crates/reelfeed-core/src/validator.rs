//! Field-bag validation.
//!
//! Every recovery tier funnels its candidates through [`validate`]: a pure
//! function from a loosely-typed field bag to either a [`ContentRecord`] or
//! a [`Rejection`]. Required-field rules short-circuit in a fixed order;
//! optional fields degrade to absence instead of rejecting the record.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::{ContentKind, ContentRecord};

/// The one category that is never stored, compared case-sensitively.
pub const EXCLUDED_CATEGORY: &str = "Korean";

/// Why a candidate field bag was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("missing title")]
    MissingTitle,

    #[error("missing category")]
    MissingCategory,

    #[error("excluded category")]
    ExcludedCategory,

    #[error("invalid type")]
    InvalidKind,
}

/// Validate a field bag into a record.
///
/// Rules, in order, short-circuiting on the first failure:
/// 1. `title` present and non-empty
/// 2. `category` present, non-empty, and not [`EXCLUDED_CATEGORY`]
/// 3. `type` exactly `"movie"` or `"series"`
/// 4. `extra_info` defaults to empty when absent
/// 5. `year` dropped (not a rejection) when unparseable as an integer
/// 6. `rating` dropped when unparseable as a float
///
/// Never panics, whatever the bag contains.
pub fn validate(bag: &Map<String, Value>) -> Result<ContentRecord, Rejection> {
    let title = non_empty_string(bag.get("title")).ok_or(Rejection::MissingTitle)?;

    let category = non_empty_string(bag.get("category")).ok_or(Rejection::MissingCategory)?;
    if category == EXCLUDED_CATEGORY {
        return Err(Rejection::ExcludedCategory);
    }

    let kind = bag
        .get("type")
        .and_then(Value::as_str)
        .and_then(ContentKind::parse)
        .ok_or(Rejection::InvalidKind)?;

    let extra_info = bag
        .get("extra_info")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ContentRecord {
        title,
        kind,
        category,
        extra_info,
        year: bag.get("year").and_then(parse_year),
        rating: bag.get("rating").and_then(parse_rating),
        source_url: None,
    })
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
