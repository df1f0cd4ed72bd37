//! Declared keys: dotted path parsing and record-to-token extraction.
//!
//! - `path`: the `seg1.seg2.*.seg4` path syntax
//! - `extract`: walking a record along a path and tokenising its leaves

pub mod extract;
pub mod path;

pub use extract::{extract_fields, tokenize_leaf, FieldNode};
pub use path::{KeyPath, PathError, PathSegment};
