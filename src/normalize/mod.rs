//! Text normalisation: case folding, Latin diacritic folding and separator
//! collapse.
//!
//! Every string that enters the scoring pipeline (query tokens, field
//! tokens, fused strings) goes through [`normalize`] first, so the kernels
//! only ever compare folded text. The position-mapped variant
//! [`fold_with_map`] is used by the highlighter, which must translate span
//! positions on folded text back to positions in the raw string.

/// Fold a single character: lowercase it, then replace a fixed table of
/// Latin-1 / Latin Extended-A diacritics with their unaccented base letters.
/// `æ` and `œ` expand to two characters. Anything not in the table passes
/// through unchanged.
pub fn fold_char_into(ch: char, out: &mut String) {
    for lc in ch.to_lowercase() {
        match lc {
            'ã' | 'à' | 'á' | 'ä' | 'â' => out.push('a'),
            'ẽ' | 'è' | 'é' | 'ë' | 'ê' => out.push('e'),
            'ì' | 'í' | 'ï' | 'î' => out.push('i'),
            'õ' | 'ò' | 'ó' | 'ö' | 'ô' => out.push('o'),
            'ù' | 'ú' | 'ü' | 'û' => out.push('u'),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'ñ' => out.push('n'),
            'ç' => out.push('c'),
            c => out.push(c),
        }
    }
}

/// Test whether `ch` is one of the configured separator characters.
pub fn is_separator(ch: char, separators: &str) -> bool {
    separators.contains(ch) || ch.is_whitespace()
}

/// Normalise a string: case-fold, diacritic-fold, collapse every run of
/// separator characters to a single space and trim the ends.
///
/// Total and deterministic; the empty string maps to itself, and the
/// function is idempotent.
pub fn normalize(input: &str, separators: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for ch in input.chars() {
        fold_char_into(ch, &mut folded);
    }

    let mut out = String::with_capacity(folded.len());
    let mut pending_sep = false;
    for ch in folded.chars() {
        if is_separator(ch, separators) {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push(' ');
                pending_sep = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Normalise a string while recording, for each character of the output,
/// the index of the raw character that produced it.
///
/// Separator runs collapse to one space mapped to the first separator of
/// the run; expanded folds (`æ` → `ae`) map both output characters to the
/// same raw character. The returned map lets the highlighter translate a
/// span over normalised text into a span over the raw input.
pub fn normalize_with_map(input: &str, separators: &str) -> (String, Vec<usize>) {
    let mut out = String::new();
    let mut map = Vec::new();
    let mut pending_sep: Option<usize> = None;

    for (raw_idx, ch) in input.chars().enumerate() {
        if is_separator(ch, separators) {
            if !out.is_empty() && pending_sep.is_none() {
                pending_sep = Some(raw_idx);
            }
            continue;
        }
        if let Some(sep_idx) = pending_sep.take() {
            out.push(' ');
            map.push(sep_idx);
        }
        let before = out.chars().count();
        fold_char_into(ch, &mut out);
        let after = out.chars().count();
        for _ in before..after {
            map.push(raw_idx);
        }
    }

    (out, map)
}

/// Fold a single word (no separators inside) with a position map from
/// folded character index to raw character index.
pub fn fold_with_map(word: &str) -> (String, Vec<usize>) {
    let mut out = String::new();
    let mut map = Vec::new();
    let mut count = 0usize;
    for (raw_idx, ch) in word.chars().enumerate() {
        fold_char_into(ch, &mut out);
        let new_count = out.chars().count();
        for _ in count..new_count {
            map.push(raw_idx);
        }
        count = new_count;
    }
    (out, map)
}
