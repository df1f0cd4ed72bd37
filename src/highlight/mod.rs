//! Highlighted rendering of a matched field string.
//!
//! The raw string is split into words with their separator runs preserved,
//! query tokens are paired 1-to-1 with field words, and each paired word is
//! aligned to produce marked spans. When the fused pass scores better than
//! the token pairing, the whole field is treated as a single token.

pub mod align;

pub use align::align;

use crate::engine::core::SuggestEngine;
use crate::normalize::{fold_with_map, is_separator, normalize_with_map};
use crate::query::Query;
use crate::score::{kernel, match_tokens};
use crate::types::Span;

impl SuggestEngine {
    /// Parse `query` and render `field` with the configured highlight
    /// markers around the matched slices.
    pub fn highlight(&self, query: &str, field: &str) -> String {
        let parsed = self.parse_query(query);
        self.highlight_with_query(&parsed, field)
    }

    /// Highlight `field` against an already-parsed query. Original
    /// whitespace and separators are preserved byte-for-byte.
    pub fn highlight_with_query(&self, query: &Query, field: &str) -> String {
        if field.is_empty() {
            return String::new();
        }

        let tokens = query_tokens(query);
        if tokens.is_empty() {
            return field.to_string();
        }

        let words = split_words(field, &self.options.token_sep);
        let folded: Vec<(String, Vec<usize>)> = words
            .iter()
            .map(|w| fold_with_map(&field[w.start..w.end]))
            .collect();
        let norm_words: Vec<String> = folded.iter().map(|(norm, _)| norm.clone()).collect();

        let pairing = match_tokens(tokens, &norm_words, &self.options);

        // The fused pass takes over when it explains the field better than
        // the token pairing does.
        let (norm_field, field_map) = normalize_with_map(field, &self.options.token_sep);
        let fused_score = kernel::score_map(
            &query.core.fused,
            &norm_field,
            &query.core.fused_map,
            &self.options,
        );
        if fused_score > pairing.score {
            let spans = align(&query.core.fused, &norm_field, &self.options);
            return self.emit_whole(field, &spans, &field_map);
        }
        if pairing.score <= 0.0 {
            return field.to_string();
        }

        let mut word_to_query: Vec<Option<usize>> = vec![None; words.len()];
        for (qi, &wj) in pairing.pairs.iter().enumerate() {
            if wj >= 0 {
                word_to_query[wj as usize] = Some(qi);
            }
        }

        let mut out = String::with_capacity(field.len() + 32);
        for (wi, word) in words.iter().enumerate() {
            out.push_str(&field[word.sep_start..word.start]);
            let slice = &field[word.start..word.end];
            match word_to_query[wi] {
                Some(qi) => {
                    let (norm, map) = &folded[wi];
                    let spans = align(&tokens[qi], norm, &self.options);
                    self.emit_word(&mut out, slice, &spans, map);
                }
                None => out.push_str(slice),
            }
        }
        if let Some(last) = words.last() {
            out.push_str(&field[last.end..]);
        }
        out
    }

    /// Emit one word with markers around its matched spans. `map` goes
    /// from folded character index to word-relative raw character index.
    fn emit_word(&self, out: &mut String, raw: &str, spans: &[Span], map: &[usize]) {
        if spans.is_empty() {
            out.push_str(raw);
            return;
        }
        let bytes = char_byte_offsets(raw);
        let mut cursor = 0usize;
        for span in spans {
            if span.is_empty() || span.end > map.len() {
                continue;
            }
            let start = bytes[map[span.start]];
            let end = bytes[map[span.end - 1] + 1];
            if start < cursor {
                continue;
            }
            out.push_str(&raw[cursor..start]);
            out.push_str(&self.options.highlight_before);
            out.push_str(&raw[start..end]);
            out.push_str(&self.options.highlight_after);
            cursor = end;
        }
        out.push_str(&raw[cursor..]);
    }

    /// Whole-field emission for the fused path; `map` goes from normalised
    /// character index to raw character index.
    fn emit_whole(&self, field: &str, spans: &[Span], map: &[usize]) -> String {
        if spans.is_empty() {
            return field.to_string();
        }
        let bytes = char_byte_offsets(field);
        let mut out = String::with_capacity(field.len() + 32);
        let mut cursor = 0usize;
        for span in spans {
            if span.is_empty() || span.end > map.len() {
                continue;
            }
            let start = bytes[map[span.start]];
            let end = bytes[map[span.end - 1] + 1];
            if start < cursor {
                continue;
            }
            out.push_str(&field[cursor..start]);
            out.push_str(&self.options.highlight_before);
            out.push_str(&field[start..end]);
            out.push_str(&self.options.highlight_after);
            cursor = end;
        }
        out.push_str(&field[cursor..]);
        out
    }
}

/// The tokens to highlight with: the root query's, or the first tagged
/// child's when the root is empty.
fn query_tokens(query: &Query) -> &[String] {
    if !query.core.tokens.is_empty() {
        return &query.core.tokens;
    }
    query
        .children
        .iter()
        .flatten()
        .map(|c| c.tokens.as_slice())
        .find(|t| !t.is_empty())
        .unwrap_or(&[])
}

/// One word of the raw string: its byte range plus the byte range of the
/// separator run before it.
#[derive(Debug, Clone, Copy)]
struct RawWord {
    sep_start: usize,
    start: usize,
    end: usize,
}

fn split_words(field: &str, separators: &str) -> Vec<RawWord> {
    let mut words = Vec::new();
    let mut sep_start = 0usize;
    let mut word_start: Option<usize> = None;
    for (idx, ch) in field.char_indices() {
        if is_separator(ch, separators) {
            if let Some(start) = word_start.take() {
                words.push(RawWord {
                    sep_start,
                    start,
                    end: idx,
                });
                sep_start = idx;
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        words.push(RawWord {
            sep_start,
            start,
            end: field.len(),
        });
    }
    words
}

/// Byte offset of each character plus a trailing sentinel, so a char span
/// `[s, e)` slices as `bytes[s]..bytes[e]`.
fn char_byte_offsets(raw: &str) -> Vec<usize> {
    let mut out: Vec<usize> = raw.char_indices().map(|(idx, _)| idx).collect();
    out.push(raw.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SearchOptions;
    use serde_json::json;

    fn engine() -> SuggestEngine {
        let options = SearchOptions {
            source: vec![json!("placeholder")],
            highlight_before: "<mark>".to_string(),
            highlight_after: "</mark>".to_string(),
            ..Default::default()
        };
        SuggestEngine::new(options).unwrap()
    }

    #[test]
    fn test_highlight_pairs_tokens() {
        let engine = engine();
        let out = engine.highlight("john doe", "John Ronald Doe");
        assert_eq!(out, "<mark>John</mark> Ronald <mark>Doe</mark>");
    }

    #[test]
    fn test_highlight_preserves_whitespace() {
        let engine = engine();
        let out = engine.highlight("john", "  John   Ronald ");
        assert_eq!(out, "  <mark>John</mark>   Ronald ");
    }

    #[test]
    fn test_highlight_no_match_returns_field() {
        let engine = engine();
        assert_eq!(engine.highlight("zzz", "John Doe"), "John Doe");
        assert_eq!(engine.highlight("", "John Doe"), "John Doe");
    }

    #[test]
    fn test_highlight_accented_field() {
        let engine = engine();
        let out = engine.highlight("creme", "Crème fraîche");
        assert_eq!(out, "<mark>Crème</mark> fraîche");
    }

    #[test]
    fn test_highlight_fused_joined_word() {
        let options = SearchOptions {
            source: vec![json!("placeholder")],
            score_test_fused: true,
            highlight_before: "<mark>".to_string(),
            highlight_after: "</mark>".to_string(),
            ..Default::default()
        };
        let engine = SuggestEngine::new(options).unwrap();
        // Token-wise pairing fails on the joined word; the fused pass
        // highlights through it.
        let out = engine.highlight("old man", "oldman");
        assert!(out.contains("<mark>"), "got {out}");
    }

    #[test]
    fn test_highlight_partial_word() {
        let engine = engine();
        let out = engine.highlight("surgeo", "surgery");
        assert!(out.starts_with("<mark>surge"), "got {out}");
    }

    #[test]
    fn test_split_words_ranges() {
        let words = split_words("  foo bar ", " .,-:");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].start, 2);
        assert_eq!(words[0].end, 5);
        assert_eq!(words[1].sep_start, 5);
        assert_eq!(words[1].start, 6);
    }
}
