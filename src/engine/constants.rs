//! Default option values, shared between the config and its tests.

pub const DEFAULT_MINIMUM_MATCH: f64 = 1.0;
pub const DEFAULT_THRESH_INCLUDE: f64 = 2.0;
pub const DEFAULT_THRESH_RELATIVE_TO_BEST: f64 = 0.5;
pub const DEFAULT_FIELD_GOOD_ENOUGH: f64 = 20.0;

pub const DEFAULT_BONUS_MATCH_START: f64 = 0.5;
pub const DEFAULT_BONUS_TOKEN_ORDER: f64 = 2.0;
pub const DEFAULT_BONUS_POSITION_DECAY: f64 = 0.7;

pub const DEFAULT_SCORE_ROUND: f64 = 0.1;
pub const DEFAULT_OUTPUT_LIMIT: usize = 0;
pub const DEFAULT_MAX_INNERS: usize = 0;

pub const DEFAULT_TOKEN_SEP: &str = " .,-:";
pub const DEFAULT_JOIN_STR: &str = ", ";

pub const DEFAULT_TOKEN_QUERY_MIN_LENGTH: usize = 2;
pub const DEFAULT_TOKEN_QUERY_MAX_LENGTH: usize = 64;
pub const DEFAULT_TOKEN_FIELD_MIN_LENGTH: usize = 3;
pub const DEFAULT_TOKEN_FIELD_MAX_LENGTH: usize = 64;
pub const DEFAULT_TOKEN_FUSED_MAX_LENGTH: usize = 64;

pub const DEFAULT_TOKEN_MIN_REL_SIZE: f64 = 0.6;
pub const DEFAULT_TOKEN_MAX_REL_SIZE: f64 = 10.0;

pub const DEFAULT_STORE_THRESH: f64 = 0.7;
pub const DEFAULT_STORE_MAX_RESULTS: usize = 1500;

pub const DEFAULT_HIGHLIGHT_BRIDGE_GAP: usize = 2;
pub const DEFAULT_HIGHLIGHT_BEFORE: &str = "<strong class=\"highlight\">";
pub const DEFAULT_HIGHLIGHT_AFTER: &str = "</strong>";
