//! Tier C: fragment reconstruction.
//!
//! Last resort for a slice that would not parse even after both repair
//! passes. The array is chopped at approximate object boundaries and each
//! fragment is parsed in isolation, so one irreparably broken object no
//! longer drags down its siblings.

use serde_json::{Map, Value};

use crate::normalizer::DiscardCounts;

/// Split the repaired Tier-B slice at `"},"` boundaries and salvage every
/// fragment that parses as a standalone field bag.
pub(super) fn rebuild(slice: &str, discarded: &mut DiscardCounts) -> Vec<Map<String, Value>> {
    let trimmed = slice.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Vec::new();
    }

    let content = trimmed[1..trimmed.len() - 1].trim();

    let mut fragments: Vec<String> = content.split("},").map(str::to_string).collect();
    let last = fragments.len() - 1;
    for fragment in &mut fragments[..last] {
        fragment.push('}');
    }
    if !fragments[last].trim_end().ends_with('}') {
        fragments[last].push('}');
    }

    let mut bags = Vec::new();
    for fragment in fragments {
        let mut candidate = fragment.trim().to_string();
        if !candidate.starts_with('{') {
            candidate.insert(0, '{');
        }
        if !candidate.ends_with('}') {
            candidate.push('}');
        }

        match serde_json::from_str::<Map<String, Value>>(&candidate) {
            Ok(bag) => bags.push(bag),
            Err(err) => {
                tracing::debug!(%err, "discarding unparseable fragment");
                discarded.rebuild_unparsed += 1;
            }
        }
    }

    bags
}
