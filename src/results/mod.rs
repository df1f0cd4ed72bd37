//! Search results and output projection.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// How a matched record is rendered into the result's `item`.
#[derive(Clone, Default)]
pub enum OutputMap {
    /// Return the record as-is.
    #[default]
    Item,
    /// Build an object mapping each declared tag to the field's joined
    /// leaf text.
    Alias,
    /// Extract the value at a dotted path inside the record.
    Field(String),
    /// Caller-supplied projection.
    Custom(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl fmt::Debug for OutputMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMap::Item => write!(f, "OutputMap::Item"),
            OutputMap::Alias => write!(f, "OutputMap::Alias"),
            OutputMap::Field(path) => write!(f, "OutputMap::Field({path:?})"),
            OutputMap::Custom(_) => write!(f, "OutputMap::Custom(..)"),
        }
    }
}

/// One scored search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// The record, projected through the configured output map.
    pub item: Value,
    /// Rounded score.
    pub score: f64,
    /// Index of the best-matching declared field.
    pub match_index: usize,
    /// Index of the best-matching leaf inside that field.
    pub sub_index: usize,
    /// Alphabetical tie-break key (the first field's flattened text).
    #[serde(skip)]
    pub(crate) sort_key: String,
}

/// Descending score, ties broken alphabetically on the sort key.
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.sort_key.cmp(&b.sort_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(score: f64, key: &str) -> SearchResult {
        SearchResult {
            item: json!(null),
            score,
            match_index: 0,
            sub_index: 0,
            sort_key: key.to_string(),
        }
    }

    #[test]
    fn test_sort_descending_with_alpha_tiebreak() {
        let mut results = vec![result(1.0, "beta"), result(2.0, "zeta"), result(1.0, "alpha")];
        results.sort_by(compare_results);
        let keys: Vec<&str> = results.iter().map(|r| r.sort_key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "beta"]);
    }
}
