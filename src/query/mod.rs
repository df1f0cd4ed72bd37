//! Prepared queries: normalised tokens, pack groups, the fused string and
//! the per-search scratch the composer mutates.
//!
//! A [`Query`] is a root [`QueryCore`] plus one optional child core per
//! declared key — a child is present when the raw query carried a `tag:`
//! marker for that key. The tree is one level deep by construction.

pub mod parser;

pub use parser::parse_query;

use crate::alphabet::{pack_tokens, AlphabetMap, PackGroup};
use crate::engine::config::SearchOptions;
use crate::normalize::normalize;

/// One scoring unit: the tokens of a query segment, packed, with the fused
/// fallback string and mutable per-record scratch.
#[derive(Debug, Clone)]
pub struct QueryCore {
    /// Raw segment as the caller wrote it.
    pub raw: String,
    /// Normalised segment.
    pub normalized: String,
    /// Size-filtered tokens, in order.
    pub tokens: Vec<String>,
    /// Tokens packed into machine-word groups.
    pub groups: Vec<PackGroup>,
    /// The whole normalised segment, truncated, for the fused pass.
    pub fused: String,
    /// Alphabet of the fused string.
    pub fused_map: AlphabetMap,
    /// Best fused score seen for the current record (scratch).
    pub fused_score: f64,
    /// Reusable buffer for packed kernel output (scratch).
    pub pack_buf: Vec<f64>,
}

impl QueryCore {
    pub fn build(options: &SearchOptions, raw: &str) -> Self {
        let normalized = normalize(raw, &options.token_sep);

        let mut tokens = Vec::new();
        for word in normalized.split(' ') {
            if word.is_empty() {
                continue;
            }
            let len = word.chars().count();
            if len < options.token_query_min_length {
                continue;
            }
            if len > options.token_query_max_length {
                tokens.push(word.chars().take(options.token_query_max_length).collect());
            } else {
                tokens.push(word.to_string());
            }
        }

        let groups = pack_tokens(&tokens);
        let fused: String = normalized
            .chars()
            .take(options.token_fused_max_length)
            .collect();
        let fused_map = AlphabetMap::build(&fused);

        Self {
            raw: raw.to_string(),
            normalized,
            tokens,
            groups,
            fused,
            fused_map,
            fused_score: 0.0,
            pack_buf: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.fused.is_empty()
    }

    /// Zero the per-record scratch.
    pub fn reset_item(&mut self) {
        for group in self.groups.iter_mut() {
            group.reset_item();
        }
        self.fused_score = 0.0;
    }

    /// Sum of the best per-token scores seen for the current record, with
    /// the fused score taking over when it is higher.
    pub fn item_score(&self) -> f64 {
        let sum: f64 = self
            .groups
            .iter()
            .flat_map(|g| g.score_item.iter())
            .sum();
        sum.max(self.fused_score)
    }
}

/// A parsed search query: root segment plus per-tag children.
#[derive(Debug, Clone)]
pub struct Query {
    pub core: QueryCore,
    /// One slot per declared key, filled when the query tagged that key.
    pub children: Vec<Option<QueryCore>>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.children.iter().flatten().all(|c| c.is_empty())
    }

    pub fn reset_item(&mut self) {
        self.core.reset_item();
        for child in self.children.iter_mut().flatten() {
            child.reset_item();
        }
    }

    /// Per-record aggregate: the root's slots plus every child's.
    pub fn item_score(&self) -> f64 {
        self.core.item_score()
            + self
                .children
                .iter()
                .flatten()
                .map(|c| c.item_score())
                .sum::<f64>()
    }
}
