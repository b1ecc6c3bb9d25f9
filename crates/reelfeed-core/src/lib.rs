//! # reelfeed-core
//!
//! Deterministic extraction pipeline for unreliable generated text.
//!
//! Text-generation providers are asked for a strict JSON array of movie and
//! series entries, and routinely return something that is almost - but not
//! quite - that. This crate turns such a response into validated
//! [`ContentRecord`]s without ever raising: structure that cannot be
//! recovered is dropped, not guessed at.
//!
//! ## Key guarantees
//!
//! 1. **Deterministic**: same input always produces the same ordered output
//! 2. **No I/O**: pure functions only; providers and storage live in
//!    `reelfeed-runtime`
//! 3. **Total**: malformed input yields an empty extraction, never a panic
//!    or an error
//! 4. **Auditable**: every result records which recovery tier produced it
//!    and how many candidates each stage discarded
//!
//! ## Example
//!
//! ```rust
//! use reelfeed_core::normalize;
//!
//! // Trailing comma and chatter around the array: still recoverable.
//! let raw = r#"Here you go!
//! [{"title":"Movie 1","year":2023,"category":"Hollywood","type":"movie",}]"#;
//!
//! let extraction = normalize(raw);
//! assert_eq!(extraction.records.len(), 1);
//! assert_eq!(extraction.records[0].title, "Movie 1");
//! ```

pub mod normalizer;
pub mod record;
pub mod validator;

// Re-export main types at crate root
pub use normalizer::{normalize, DiscardCounts, Extraction, RecoveryTier};
pub use record::{ContentKind, ContentRecord};
pub use validator::{validate, Rejection, EXCLUDED_CATEGORY};
