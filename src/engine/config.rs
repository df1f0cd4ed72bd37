//! Engine configuration: the options record, declared keys and their
//! validation.
//!
//! Options are validated once at construction and passed by read-only
//! reference into the kernels; nothing re-validates at search time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::engine::constants::*;
use crate::fields::{KeyPath, PathError};

/// Declared searchable keys.
///
/// Accepted shapes: one dotted path, a list of dotted paths, or an ordered
/// tag→path list. Tags double as query prefixes (`title:dune`) and as the
/// keys of the alias output projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeysSpec {
    Single(String),
    List(Vec<String>),
    Tagged(Vec<(String, String)>),
}

impl Default for KeysSpec {
    fn default() -> Self {
        KeysSpec::List(Vec::new())
    }
}

impl KeysSpec {
    pub fn single(path: impl Into<String>) -> Self {
        KeysSpec::Single(path.into())
    }

    pub fn list<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeysSpec::List(paths.into_iter().map(Into::into).collect())
    }

    pub fn tagged<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        KeysSpec::Tagged(
            pairs
                .into_iter()
                .map(|(tag, path)| (tag.into(), path.into()))
                .collect(),
        )
    }
}

/// One resolved key: its parsed path and, for tagged declarations, the tag
/// exposed as a query prefix.
#[derive(Debug, Clone)]
pub struct FieldKey {
    pub tag: Option<String>,
    pub path: KeyPath,
}

/// Error raised when the configuration fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidKeyPath(#[from] PathError),
    #[error("empty tag name in keys")]
    EmptyTag,
    #[error("option {name} out of range: {value} (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// The engine's options record. See the crate documentation for what each
/// knob does; defaults come from [`crate::engine::constants`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Score floor below which two tokens count as unrelated.
    pub minimum_match: f64,
    /// Absolute minimum candidate score.
    pub thresh_include: f64,
    /// Dynamic floor as a fraction of the best score so far, in [0, 1].
    pub thresh_relative_to_best: f64,
    /// Stop scanning a record's remaining fields past this field score.
    pub field_good_enough: f64,

    /// Per-character bonus for a common prefix.
    pub bonus_match_start: f64,
    /// Bonus per in-order consecutive token pair, distance-weighted.
    pub bonus_token_order: f64,
    /// Multiplicative decay of the per-field position bonus, in (0, 1].
    pub bonus_position_decay: f64,

    pub score_per_token: bool,
    pub score_test_fused: bool,
    pub score_acronym: bool,
    /// Rounding granularity applied before the tie-break.
    pub score_round: f64,

    /// Separator character set for tokenisation.
    pub token_sep: String,
    pub token_query_min_length: usize,
    pub token_query_max_length: usize,
    pub token_field_min_length: usize,
    pub token_field_max_length: usize,
    pub token_fused_max_length: usize,
    /// Reject `n/m` outside `[min, max]` before scoring.
    pub token_min_rel_size: f64,
    pub token_max_rel_size: f64,

    pub use_index_store: bool,
    pub store_thresh: f64,
    pub store_max_results: usize,

    pub highlight_prefix: bool,
    pub highlight_bridge_gap: usize,
    pub highlight_before: String,
    pub highlight_after: String,

    /// 0 means unlimited.
    pub output_limit: usize,
    /// Stop collecting once this many results accumulated; 0 = unlimited.
    pub max_inners: usize,
    /// Joiner for the alias output projection.
    pub join_str: String,

    /// Defer (re)indexing until the next search.
    pub lazy: bool,
    pub keys: KeysSpec,
    /// Initial record collection, consumed at engine construction.
    pub source: Vec<Value>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            minimum_match: DEFAULT_MINIMUM_MATCH,
            thresh_include: DEFAULT_THRESH_INCLUDE,
            thresh_relative_to_best: DEFAULT_THRESH_RELATIVE_TO_BEST,
            field_good_enough: DEFAULT_FIELD_GOOD_ENOUGH,
            bonus_match_start: DEFAULT_BONUS_MATCH_START,
            bonus_token_order: DEFAULT_BONUS_TOKEN_ORDER,
            bonus_position_decay: DEFAULT_BONUS_POSITION_DECAY,
            score_per_token: true,
            score_test_fused: false,
            score_acronym: false,
            score_round: DEFAULT_SCORE_ROUND,
            token_sep: DEFAULT_TOKEN_SEP.to_string(),
            token_query_min_length: DEFAULT_TOKEN_QUERY_MIN_LENGTH,
            token_query_max_length: DEFAULT_TOKEN_QUERY_MAX_LENGTH,
            token_field_min_length: DEFAULT_TOKEN_FIELD_MIN_LENGTH,
            token_field_max_length: DEFAULT_TOKEN_FIELD_MAX_LENGTH,
            token_fused_max_length: DEFAULT_TOKEN_FUSED_MAX_LENGTH,
            token_min_rel_size: DEFAULT_TOKEN_MIN_REL_SIZE,
            token_max_rel_size: DEFAULT_TOKEN_MAX_REL_SIZE,
            use_index_store: false,
            store_thresh: DEFAULT_STORE_THRESH,
            store_max_results: DEFAULT_STORE_MAX_RESULTS,
            highlight_prefix: false,
            highlight_bridge_gap: DEFAULT_HIGHLIGHT_BRIDGE_GAP,
            highlight_before: DEFAULT_HIGHLIGHT_BEFORE.to_string(),
            highlight_after: DEFAULT_HIGHLIGHT_AFTER.to_string(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
            max_inners: DEFAULT_MAX_INNERS,
            join_str: DEFAULT_JOIN_STR.to_string(),
            lazy: false,
            keys: KeysSpec::default(),
            source: Vec::new(),
        }
    }
}

impl SearchOptions {
    /// Validate the numeric ranges. Key paths are validated separately by
    /// [`resolve_keys`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn range(
            name: &'static str,
            value: f64,
            ok: bool,
            expected: &'static str,
        ) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    name,
                    value,
                    expected,
                })
            }
        }

        range(
            "thresh_relative_to_best",
            self.thresh_relative_to_best,
            (0.0..=1.0).contains(&self.thresh_relative_to_best),
            "[0, 1]",
        )?;
        range(
            "bonus_position_decay",
            self.bonus_position_decay,
            self.bonus_position_decay > 0.0 && self.bonus_position_decay <= 1.0,
            "(0, 1]",
        )?;
        range(
            "store_thresh",
            self.store_thresh,
            (0.0..=1.0).contains(&self.store_thresh),
            "[0, 1]",
        )?;
        range(
            "score_round",
            self.score_round,
            self.score_round > 0.0,
            "> 0",
        )?;
        range(
            "field_good_enough",
            self.field_good_enough,
            self.field_good_enough > 0.0,
            "> 0",
        )?;
        range(
            "minimum_match",
            self.minimum_match,
            self.minimum_match >= 0.0,
            ">= 0",
        )?;
        range(
            "token_min_rel_size",
            self.token_min_rel_size,
            self.token_min_rel_size >= 0.0
                && self.token_min_rel_size <= self.token_max_rel_size,
            "[0, token_max_rel_size]",
        )?;
        if self.use_index_store && self.store_max_results == 0 {
            return Err(ConfigError::OutOfRange {
                name: "store_max_results",
                value: 0.0,
                expected: "> 0 when the store is enabled",
            });
        }
        Ok(())
    }
}

/// Resolve the declared keys into parsed paths. An empty declaration means
/// the record itself is the single searchable field.
pub fn resolve_keys(spec: &KeysSpec) -> Result<Vec<FieldKey>, ConfigError> {
    let mut keys = Vec::new();
    match spec {
        KeysSpec::Single(path) => {
            keys.push(FieldKey {
                tag: None,
                path: KeyPath::parse(path)?,
            });
        }
        KeysSpec::List(paths) => {
            for path in paths {
                keys.push(FieldKey {
                    tag: None,
                    path: KeyPath::parse(path)?,
                });
            }
        }
        KeysSpec::Tagged(pairs) => {
            for (tag, path) in pairs {
                if tag.trim().is_empty() {
                    return Err(ConfigError::EmptyTag);
                }
                keys.push(FieldKey {
                    tag: Some(tag.trim().to_lowercase()),
                    path: KeyPath::parse(path)?,
                });
            }
        }
    }
    if keys.is_empty() {
        keys.push(FieldKey {
            tag: None,
            path: KeyPath::root(),
        });
    }
    Ok(keys)
}
