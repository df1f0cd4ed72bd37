//! Approximate string-matching engine for suggest-as-you-type autocomplete
//! over in-memory collections of structured records.
//!
//! Records are walked along declared key paths, tokenised and scored
//! against the query with bit-parallel LCS kernels; results are ranked
//! with field-position decay, word-order bonuses and a fused fallback for
//! space-bar-broken queries. A Smith–Waterman–Gotoh alignment produces
//! highlighted renderings of matched strings on demand.
//!
//! ```
//! use quicksuggest::{SearchOptions, SuggestEngine};
//! use serde_json::json;
//!
//! let options = SearchOptions {
//!     source: vec![json!("survey"), json!("surgery"), json!("insurgence")],
//!     ..Default::default()
//! };
//! let mut engine = SuggestEngine::new(options).unwrap();
//! let results = engine.search("surgeo");
//! assert_eq!(results[0].item, json!("surgery"));
//! ```

pub mod alphabet;
pub mod engine;
pub mod fields;
pub mod highlight;
pub mod normalize;
pub mod query;
pub mod results;
pub mod score;
pub mod store;
pub mod types;

pub use engine::{ConfigError, FieldKey, KeysSpec, SearchOptions, SuggestEngine};
pub use fields::{KeyPath, PathError};
pub use query::Query;
pub use results::{OutputMap, SearchResult};
pub use types::Span;
