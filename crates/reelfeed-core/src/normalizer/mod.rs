//! The tiered response normalizer.
//!
//! Maps one raw provider response to an ordered sequence of validated
//! [`ContentRecord`]s, tolerating the structural damage generated text
//! routinely arrives with. Three strategies run in strict order, cheapest
//! and most tolerant first:
//!
//! - **Tier A** ([`RecoveryTier::DirectScan`]): label-anchored field
//!   extraction from non-nested brace blocks; no parsing at all.
//! - **Tier B** ([`RecoveryTier::ArrayRepair`]): isolate the array slice,
//!   apply a fixed textual repair sequence, parse (with one retry after a
//!   narrower second pass).
//! - **Tier C** ([`RecoveryTier::FragmentRebuild`]): chop the unparseable
//!   slice at object boundaries and salvage fragments individually.
//!
//! A tier is skipped as soon as an earlier one has produced at least one
//! valid record; Tier C runs only when both Tier B parse attempts failed.
//! The pipeline never errors: the worst case is an empty extraction.

mod reconstruct;
mod repair;
mod scan;

use serde_json::{Map, Value};
use std::fmt;

use crate::record::ContentRecord;
use crate::validator;

/// Which recovery strategy produced a non-empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryTier {
    /// Tier A: label-anchored scan of brace blocks.
    DirectScan,
    /// Tier B: repaired array slice parsed whole.
    ArrayRepair,
    /// Tier C: per-fragment reconstruction of an unparseable slice.
    FragmentRebuild,
}

impl RecoveryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectScan => "direct_scan",
            Self::ArrayRepair => "array_repair",
            Self::FragmentRebuild => "fragment_rebuild",
        }
    }
}

impl fmt::Display for RecoveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many candidates each stage threw away. Observability only; the
/// counts never affect the record sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardCounts {
    /// Tier A blocks that failed validation.
    pub scan_rejected: usize,
    /// Tier B parsed bags that failed validation.
    pub repair_rejected: usize,
    /// Tier C fragments that did not parse in isolation.
    pub rebuild_unparsed: usize,
    /// Tier C parsed bags that failed validation.
    pub rebuild_rejected: usize,
}

impl DiscardCounts {
    pub fn total(&self) -> usize {
        self.scan_rejected + self.repair_rejected + self.rebuild_unparsed + self.rebuild_rejected
    }
}

/// The pipeline's result: validated records plus provenance.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Valid records in the order they appeared in the response.
    pub records: Vec<ContentRecord>,

    /// The tier that produced the records; `None` when nothing survived.
    pub tier: Option<RecoveryTier>,

    pub discarded: DiscardCounts,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize one raw response into validated records.
///
/// Deterministic: the same input always yields the same ordered sequence.
/// Never panics and never returns an error, whatever `raw` contains.
pub fn normalize(raw: &str) -> Extraction {
    let mut discarded = DiscardCounts::default();

    // Tier A
    let records = scan::direct_scan(raw, &mut discarded);
    if !records.is_empty() {
        tracing::debug!(count = records.len(), tier = %RecoveryTier::DirectScan, "extraction complete");
        return Extraction {
            records,
            tier: Some(RecoveryTier::DirectScan),
            discarded,
        };
    }

    // Tier B
    let slice = match repair::array_recovery(raw) {
        repair::Recovery::Parsed(bags) => {
            let records = validate_bags(bags, &mut discarded.repair_rejected);
            let tier = (!records.is_empty()).then_some(RecoveryTier::ArrayRepair);
            tracing::debug!(count = records.len(), "array recovery parsed");
            return Extraction {
                records,
                tier,
                discarded,
            };
        }
        repair::Recovery::NoPayload => {
            return Extraction {
                records: Vec::new(),
                tier: None,
                discarded,
            };
        }
        repair::Recovery::Unparsed(slice) => slice,
    };

    // Tier C
    let bags = reconstruct::rebuild(&slice, &mut discarded);
    let records = validate_bags(bags, &mut discarded.rebuild_rejected);
    let tier = (!records.is_empty()).then_some(RecoveryTier::FragmentRebuild);
    tracing::debug!(count = records.len(), "fragment rebuild finished");
    Extraction {
        records,
        tier,
        discarded,
    }
}

fn validate_bags(bags: Vec<Map<String, Value>>, rejected: &mut usize) -> Vec<ContentRecord> {
    let mut records = Vec::new();
    for bag in bags {
        match validator::validate(&bag) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::debug!(%reason, "dropping invalid candidate");
                *rejected += 1;
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContentKind;
    use proptest::prelude::*;

    #[test]
    fn test_well_formed_array_resolved_by_direct_scan() {
        let raw = r#"[{"title":"Movie 1","year":2023,"category":"Hollywood","extra_info":"Action","type":"movie"}]"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.tier, Some(RecoveryTier::DirectScan));

        let record = &extraction.records[0];
        assert_eq!(record.title, "Movie 1");
        assert_eq!(record.year, Some(2023));
        assert_eq!(record.category, "Hollywood");
        assert_eq!(record.extra_info, "Action");
        assert_eq!(record.kind, ContentKind::Movie);
        assert_eq!(record.rating, None);
    }

    #[test]
    fn test_fenced_block_with_trailing_comma() {
        let raw = "```json\n[{\"title\":\"X\",\"category\":\"Foreign\",\"type\":\"series\",}]\n```";
        let extraction = normalize(raw);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "X");
        assert_eq!(extraction.records[0].kind, ContentKind::Series);
    }

    #[test]
    fn test_single_object_wrapped_into_array() {
        let raw = r#"{"title":"Y","category":"Anime","type":"movie"}"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "Y");
        assert_eq!(extraction.records[0].category, "Anime");
    }

    #[test]
    fn test_excluded_category_never_surfaces() {
        let raw = r#"[{"title":"K-Drama","category":"Korean","type":"series"},
                      {"title":"Blockbuster","category":"Hollywood","type":"movie"}]"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "Blockbuster");
        assert_eq!(extraction.discarded.scan_rejected, 1);
    }

    #[test]
    fn test_tier_b_runs_only_when_scan_finds_nothing() {
        // Nested braces defeat the block regex, so the scan comes up empty
        // and the array parse takes over.
        let raw = r#"[{"title":"Good Show","category":"Anime","type":"series","extra_info":"nested {braces} here"}]"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.tier, Some(RecoveryTier::ArrayRepair));
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].extra_info, "nested {braces} here");
    }

    #[test]
    fn test_bare_scalar_recovered_by_repair() {
        // The bare category defeats the label scan (it wants a quoted
        // value) but the repair pass quotes it.
        let raw = r#"[{"title":"X","category": Hollywood,"type":"movie"}]"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.tier, Some(RecoveryTier::ArrayRepair));
        assert_eq!(extraction.records[0].category, "Hollywood");
    }

    #[test]
    fn test_tier_c_salvages_from_hopeless_slice() {
        // First object is irreparable, second hides from the scan behind
        // nested braces; only the rebuild recovers it.
        let raw = r#"[{"title": {"bad"},"category":"Hollywood","type":"movie"},{"title":"Good {Show}","category":"Anime","type":"series","extra_info":"{Complete}"}]"#;
        let extraction = normalize(raw);

        assert_eq!(extraction.tier, Some(RecoveryTier::FragmentRebuild));
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "Good {Show}");
        assert!(extraction.discarded.rebuild_unparsed >= 1);
    }

    #[test]
    fn test_graceful_degradation_on_malformed_inputs() {
        for raw in [
            "",
            "no json here at all",
            "[",
            "]",
            "[}",
            "{",
            "``````",
            "[{\"title\":",
            "\u{0}\u{1}\u{2}",
        ] {
            let extraction = normalize(raw);
            assert!(extraction.is_empty(), "expected empty for {raw:?}");
            assert_eq!(extraction.tier, None);
        }
    }

    #[test]
    fn test_parse_success_with_all_invalid_bags_does_not_reach_tier_c() {
        // The array parses cleanly, so Tier C must not run even though
        // validation leaves nothing.
        let raw = r#"[{"category":"Anime","type":"movie"}]"#;
        let extraction = normalize(raw);

        assert!(extraction.is_empty());
        assert_eq!(extraction.tier, None);
        assert_eq!(extraction.discarded.repair_rejected, 1);
        assert_eq!(extraction.discarded.rebuild_unparsed, 0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = r#"[{"title":"A","category":"Anime","type":"movie"},
                      {"title":"B","category":"Korean","type":"series"},
                      {"title":"C","category":"Hollywood","type":"series"}]"#;

        let first = normalize(raw);
        let second = normalize(raw);

        assert_eq!(first.records, second.records);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.discarded, second.discarded);
    }

    proptest! {
        #[test]
        fn prop_never_panics_and_is_deterministic(raw in "\\PC*") {
            let first = normalize(&raw);
            let second = normalize(&raw);
            prop_assert_eq!(first.records, second.records);
            prop_assert_eq!(first.tier, second.tier);
        }

        #[test]
        fn prop_korean_never_survives(titles in proptest::collection::vec("[a-zA-Z ]{1,12}", 1..5)) {
            let body = titles
                .iter()
                .map(|t| format!(r#"{{"title":"{t}","category":"Korean","type":"movie"}}"#))
                .collect::<Vec<_>>()
                .join(",");
            let raw = format!("[{body}]");

            let extraction = normalize(&raw);
            prop_assert!(extraction.records.iter().all(|r| r.category != "Korean"));
            prop_assert!(extraction.is_empty());
        }
    }
}
