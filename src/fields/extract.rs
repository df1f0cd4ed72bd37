//! Record walking and leaf tokenisation.
//!
//! A record is walked along each declared key path; every leaf reached
//! becomes one [`FieldNode`] holding the normalised token list for that
//! leaf. Arrays and record-like values found at the end of a path expand
//! into their elements, mirroring what a trailing `*` would do.

use serde_json::Value;

use crate::engine::config::SearchOptions;
use crate::fields::path::{KeyPath, PathSegment};
use crate::normalize::{is_separator, normalize};

/// The token list produced from one leaf of a field, plus whether a
/// synthetic acronym token was appended at the tail (the fused
/// concatenation must leave it out).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub tokens: Vec<String>,
    pub has_acronym: bool,
}

impl FieldNode {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens that carry real field text, acronym excluded.
    pub fn text_tokens(&self) -> &[String] {
        if self.has_acronym {
            &self.tokens[..self.tokens.len() - 1]
        } else {
            &self.tokens
        }
    }

    /// Concatenation of the text tokens, used by the fused pass.
    pub fn fused_text(&self) -> String {
        self.text_tokens().join(" ")
    }
}

/// Walk `value` along `path` and collect every leaf reached.
///
/// A missing component yields no leaves (the "unreachable key" non-error).
pub fn collect_leaves<'a>(value: &'a Value, path: &KeyPath) -> Vec<&'a Value> {
    let mut out = Vec::new();
    walk(value, path.segments(), &mut out);
    out
}

fn walk<'a>(value: &'a Value, segments: &[PathSegment], out: &mut Vec<&'a Value>) {
    match segments.split_first() {
        None => expand_leaf(value, out),
        Some((PathSegment::Wildcard, rest)) => match value {
            Value::Array(items) => {
                for item in items {
                    walk(item, rest, out);
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    walk(item, rest, out);
                }
            }
            _ => {}
        },
        Some((PathSegment::Key(key), rest)) => match value {
            Value::Object(map) => {
                if let Some(next) = map.get(key) {
                    walk(next, rest, out);
                }
            }
            Value::Array(items) => {
                if let Ok(idx) = key.parse::<usize>() {
                    if let Some(next) = items.get(idx) {
                        walk(next, rest, out);
                    }
                }
            }
            _ => {}
        },
    }
}

/// At the end of a path, arrays and objects expand into their elements so
/// every collected leaf is a scalar.
fn expand_leaf<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                expand_leaf(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                expand_leaf(item, out);
            }
        }
        Value::Null => {}
        _ => out.push(value),
    }
}

/// String-coerce a scalar leaf.
pub fn leaf_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tokenise one leaf string into a [`FieldNode`].
///
/// The leaf is normalised, split on separators and size-filtered. When the
/// whole normalised leaf is no longer than `2 × token_field_min_length` the
/// size filter is skipped so short titles survive. With `score_acronym`
/// enabled, the first character of each word forms a synthetic token
/// appended at the tail.
pub fn tokenize_leaf(leaf: &str, options: &SearchOptions) -> FieldNode {
    let normalized = normalize(leaf, &options.token_sep);
    let total_len = normalized.chars().count();
    let skip_size_filter = total_len <= 2 * options.token_field_min_length;

    let mut tokens = Vec::new();
    for word in normalized.split(' ') {
        if word.is_empty() {
            continue;
        }
        let len = word.chars().count();
        if !skip_size_filter && len < options.token_field_min_length {
            continue;
        }
        if len > options.token_field_max_length {
            tokens.push(word.chars().take(options.token_field_max_length).collect());
        } else {
            tokens.push(word.to_string());
        }
    }

    let mut has_acronym = false;
    if options.score_acronym {
        let acronym = make_acronym(&normalized, &options.token_sep);
        if acronym.chars().count() >= 2 {
            tokens.push(acronym);
            has_acronym = true;
        }
    }

    FieldNode { tokens, has_acronym }
}

/// First non-separator character after each separator boundary of the
/// normalised leaf.
fn make_acronym(normalized: &str, separators: &str) -> String {
    let mut acronym = String::new();
    let mut at_boundary = true;
    for ch in normalized.chars() {
        if is_separator(ch, separators) {
            at_boundary = true;
        } else {
            if at_boundary {
                acronym.push(ch);
            }
            at_boundary = false;
        }
    }
    acronym
}

/// Extract the field nodes for every declared key of a record.
pub fn extract_fields(
    record: &Value,
    paths: &[KeyPath],
    options: &SearchOptions,
) -> Vec<Vec<FieldNode>> {
    paths
        .iter()
        .map(|path| {
            collect_leaves(record, path)
                .into_iter()
                .filter_map(leaf_to_string)
                .map(|leaf| tokenize_leaf(&leaf, options))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> SearchOptions {
        SearchOptions::default()
    }

    #[test]
    fn test_collect_leaves_wildcard_over_array() {
        let record = json!({"crew": [{"name": "Ripley"}, {"name": "Dallas"}]});
        let path = KeyPath::parse("crew.*.name").unwrap();
        let leaves = collect_leaves(&record, &path);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], &json!("Ripley"));
    }

    #[test]
    fn test_collect_leaves_wildcard_over_object() {
        let record = json!({"names": {"en": "apple", "fr": "pomme"}});
        let path = KeyPath::parse("names.*").unwrap();
        let leaves = collect_leaves(&record, &path);
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn test_missing_path_yields_no_leaves() {
        let record = json!({"title": "x"});
        let path = KeyPath::parse("author.name").unwrap();
        assert!(collect_leaves(&record, &path).is_empty());
    }

    #[test]
    fn test_trailing_array_expands() {
        let record = json!({"tags": ["alpha", "beta"]});
        let path = KeyPath::parse("tags").unwrap();
        assert_eq!(collect_leaves(&record, &path).len(), 2);
    }

    #[test]
    fn test_root_path_on_scalar_record() {
        let record = json!("survey");
        let leaves = collect_leaves(&record, &KeyPath::root());
        assert_eq!(leaves, vec![&json!("survey")]);
    }

    #[test]
    fn test_tokenize_filters_short_tokens() {
        let opts = options();
        let node = tokenize_leaf("The Lord of the Rings", &opts);
        // "of" is below token_field_min_length = 3; "the" survives.
        assert_eq!(node.tokens, vec!["the", "lord", "the", "rings"]);
    }

    #[test]
    fn test_short_leaf_skips_size_filter() {
        let opts = options();
        // 6 chars <= 2 * token_field_min_length, so "3" survives.
        let node = tokenize_leaf("Item 3", &opts);
        assert_eq!(node.tokens, vec!["item", "3"]);
    }

    #[test]
    fn test_single_char_leaf_survives() {
        let mut opts = options();
        opts.token_field_min_length = 2;
        let node = tokenize_leaf("x", &opts);
        assert_eq!(node.tokens, vec!["x"]);
    }

    #[test]
    fn test_oversize_token_truncated() {
        let mut opts = options();
        opts.token_field_max_length = 5;
        let node = tokenize_leaf("extraordinary things", &opts);
        assert_eq!(node.tokens, vec!["extra", "thing"]);
    }

    #[test]
    fn test_acronym_token_appended() {
        let mut opts = options();
        opts.score_acronym = true;
        let node = tokenize_leaf("John Ronald Reuel Tolkien", &opts);
        assert_eq!(
            node.tokens,
            vec!["john", "ronald", "reuel", "tolkien", "jrrt"]
        );
        assert!(node.has_acronym);
        assert_eq!(node.fused_text(), "john ronald reuel tolkien");
    }

    #[test]
    fn test_extract_fields_declared_order() {
        let opts = options();
        let record = json!({"title": "Alien", "domain": "space.horror"});
        let paths = vec![
            KeyPath::parse("title").unwrap(),
            KeyPath::parse("domain").unwrap(),
        ];
        let fields = extract_fields(&record, &paths, &opts);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0][0].tokens, vec!["alien"]);
        assert_eq!(fields[1][0].tokens, vec!["space", "horror"]);
    }
}
