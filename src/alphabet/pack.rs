//! Greedy packing of query tokens into machine-word groups.
//!
//! Consecutive short tokens share one alphabet word; the gate mask keeps
//! carries from crossing the boundary between packed tokens during the
//! kernel's additions. Tokens at least one word wide get a group of their
//! own.

use crate::alphabet::{low_mask, AlphabetMap, CharMask, PositionList, Word, WORD_BITS};

/// A group of query tokens packed into one alphabet word, with the
/// per-search scratch the composer mutates record by record.
#[derive(Debug, Clone)]
pub struct PackGroup {
    /// Packed tokens, in declared order.
    pub tokens: Vec<String>,
    /// Bit offset of each token inside the word.
    pub offsets: Vec<u32>,
    /// Combined alphabet of the group.
    pub map: AlphabetMap,
    /// 1-bits everywhere except at the last bit position of each packed
    /// token; all-ones for single-token groups.
    pub gate: Word,
    /// Best per-slot score seen across any field of the current record.
    pub score_item: Vec<f64>,
    /// Best per-slot score within the field node being scored.
    pub score_field: Vec<f64>,
    /// Index of the field token that achieved `score_field`.
    pub field_pos: Vec<usize>,
}

impl PackGroup {
    fn from_packed(tokens: Vec<String>, offsets: Vec<u32>, map: CharMask, gate: Word) -> Self {
        let slots = tokens.len();
        Self {
            tokens,
            offsets,
            map: AlphabetMap::Bits(map),
            gate,
            score_item: vec![0.0; slots],
            score_field: vec![0.0; slots],
            field_pos: vec![0; slots],
        }
    }

    fn from_single(token: String) -> Self {
        let len = token.chars().count();
        let map = if len <= WORD_BITS {
            let mut mask = CharMask::new();
            CharMask::build_at(&token, 0, &mut mask);
            AlphabetMap::Bits(mask)
        } else {
            AlphabetMap::Positions(PositionList::build(&token))
        };
        Self {
            tokens: vec![token],
            offsets: vec![0],
            map,
            gate: !0,
            score_item: vec![0.0],
            score_field: vec![0.0],
            field_pos: vec![0],
        }
    }

    pub fn slots(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_single(&self) -> bool {
        self.tokens.len() == 1
    }

    /// Zero the per-record scratch.
    pub fn reset_item(&mut self) {
        for slot in self.score_item.iter_mut() {
            *slot = 0.0;
        }
    }
}

#[derive(Default)]
struct GroupBuilder {
    tokens: Vec<String>,
    offsets: Vec<u32>,
    map: CharMask,
    gate: Word,
    offset: usize,
}

impl GroupBuilder {
    fn admit(&mut self, token: &str, len: usize) {
        CharMask::build_at(token, self.offset, &mut self.map);
        // All positions of the token except its top bit.
        self.gate |= low_mask(len - 1) << self.offset;
        self.tokens.push(token.to_string());
        self.offsets.push(self.offset as u32);
        self.offset += len;
    }

    fn flush(&mut self, groups: &mut Vec<PackGroup>) {
        if self.tokens.is_empty() {
            return;
        }
        let done = std::mem::take(self);
        let gate = if done.tokens.len() == 1 { !0 } else { done.gate };
        groups.push(PackGroup::from_packed(
            done.tokens,
            done.offsets,
            done.map,
            gate,
        ));
    }
}

/// Pack an ordered token list into groups whose total character count never
/// exceeds the machine word, preserving order within and across groups.
pub fn pack_tokens(tokens: &[String]) -> Vec<PackGroup> {
    let mut groups = Vec::new();
    let mut builder = GroupBuilder::default();

    for token in tokens {
        let len = token.chars().count();
        if len == 0 {
            continue;
        }
        if len >= WORD_BITS {
            builder.flush(&mut groups);
            groups.push(PackGroup::from_single(token.clone()));
            continue;
        }
        if builder.offset + len > WORD_BITS {
            builder.flush(&mut groups);
        }
        builder.admit(token, len);
    }
    builder.flush(&mut groups);

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pack_preserves_order_and_coverage() {
        let tokens = strings(&["alpha", "beta", "gamma", "delta"]);
        let groups = pack_tokens(&tokens);
        let covered: Vec<String> = groups
            .iter()
            .flat_map(|g| g.tokens.iter().cloned())
            .collect();
        assert_eq!(covered, tokens);
        for g in &groups {
            let total: usize = g.tokens.iter().map(|t| t.chars().count()).sum();
            assert!(total <= WORD_BITS);
        }
    }

    #[test]
    fn test_pack_offsets_consecutive() {
        let groups = pack_tokens(&strings(&["abc", "de", "fghi"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].offsets, vec![0, 3, 5]);
    }

    #[test]
    fn test_gate_excludes_top_bits() {
        let groups = pack_tokens(&strings(&["abc", "de"]));
        // "abc" at offset 0 contributes bits 0..2, "de" at offset 3 bit 3.
        assert_eq!(groups[0].gate, 0b01011);
    }

    #[test]
    fn test_single_token_group_gate_all_ones() {
        let groups = pack_tokens(&strings(&["lonely"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].gate, !0u32);
    }

    #[test]
    fn test_word_sized_token_gets_own_group() {
        let w: String = std::iter::repeat('x').take(32).collect();
        let groups = pack_tokens(&strings(&["ab", &w, "cd"]));
        assert_eq!(groups.len(), 3);
        assert!(matches!(groups[1].map, AlphabetMap::Bits(_)));
        assert_eq!(groups[1].gate, !0u32);
    }

    #[test]
    fn test_long_token_uses_position_list() {
        let long: String = std::iter::repeat('y').take(40).collect();
        let groups = pack_tokens(&strings(&[&long]));
        assert_eq!(groups.len(), 1);
        assert!(matches!(groups[0].map, AlphabetMap::Positions(_)));
    }

    #[test]
    fn test_overflow_starts_new_group() {
        // 20 + 13 > 32 so the second token opens a new group.
        let a: String = std::iter::repeat('a').take(20).collect();
        let b: String = std::iter::repeat('b').take(13).collect();
        let groups = pack_tokens(&strings(&[&a, &b]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].offsets, vec![0]);
    }
}
