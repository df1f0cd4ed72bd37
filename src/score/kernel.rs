//! Bit-parallel LCS kernel for tokens up to one machine word, plus the
//! score formula and relative-size guards shared by every kernel.
//!
//! The short kernel is the Hyyrö bit-vector LLCS recurrence: each set bit
//! of `S` marks a column of the DP row that has not yet risen; the gated
//! add/subtract pair advances the whole row in one word operation per
//! character of the field token.

use crate::alphabet::{low_mask, AlphabetMap, CharMask, WORD_BITS};
use crate::engine::config::SearchOptions;
use crate::score::blocks::llcs_blocks;

/// Length of the common prefix of two tokens, in characters.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}

/// The score of an `llcs`-long common subsequence between tokens of length
/// `m` and `n` with a common prefix of `prefix` characters.
///
/// The quadratic in `llcs` favours fewer, longer matches over many short
/// fragmentary ones.
#[inline]
pub fn score_formula(
    m: usize,
    n: usize,
    llcs: usize,
    prefix: usize,
    options: &SearchOptions,
) -> f64 {
    let sz = (m + n) as f64 / (2.0 * m as f64 * n as f64);
    sz * (llcs * llcs) as f64 + options.bonus_match_start * prefix as f64
}

/// Relative-size guard: tokens whose lengths differ too much are treated as
/// unrelated before any kernel runs.
#[inline]
pub fn size_guard(m: usize, n: usize, options: &SearchOptions) -> bool {
    let n = n as f64;
    let m = m as f64;
    n >= options.token_min_rel_size * m && n <= options.token_max_rel_size * m
}

/// LLCS of a query token of length `m ≤ WORD_BITS` (whose alphabet is
/// `map`) against `b`, with the first `prefix` characters already matched.
///
/// The prefix columns start as already-risen (cleared) bits: that both
/// keeps them out of the final count and stops a prefix position from
/// capturing a later character of `b` that the suffix needs.
pub fn llcs_short(m: usize, b: &str, prefix: usize, map: &CharMask) -> usize {
    let keep = low_mask(m) & !low_mask(prefix);
    let mut s = keep;
    for ch in b.chars().skip(prefix) {
        let u = s & map.get(ch);
        s = s.wrapping_add(u) | s.wrapping_sub(u);
    }
    prefix + (!s & keep).count_ones() as usize
}

/// Score one query token against one field token through whichever kernel
/// its length calls for.
///
/// `map` must be the alphabet of `a`. Returns 0 when either token is empty
/// or the relative-size guard rejects the pair.
pub fn score_map(a: &str, b: &str, map: &AlphabetMap, options: &SearchOptions) -> f64 {
    let m = a.chars().count();
    let n = b.chars().count();
    if m == 0 || n == 0 {
        return 0.0;
    }
    if !size_guard(m, n, options) {
        return 0.0;
    }

    let prefix = common_prefix_len(a, b);
    let llcs = if prefix == m.min(n) {
        prefix
    } else {
        match map {
            AlphabetMap::Bits(mask) => {
                debug_assert!(m <= WORD_BITS);
                llcs_short(m, b, prefix, mask)
            }
            AlphabetMap::Positions(positions) => llcs_blocks(positions, b, prefix),
        }
    };

    score_formula(m, n, llcs, prefix, options)
}

/// Convenience entry that builds the alphabet of `a` on the fly. Used where
/// no prepared alphabet exists, e.g. the assignment matrix.
pub fn score_pair(a: &str, b: &str, options: &SearchOptions) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let map = AlphabetMap::build(a);
    score_map(a, b, &map, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::score::testutil::lcs_reference;

    fn options() -> SearchOptions {
        SearchOptions::default()
    }

    fn llcs_of(a: &str, b: &str) -> usize {
        let map = match AlphabetMap::build(a) {
            AlphabetMap::Bits(m) => m,
            AlphabetMap::Positions(_) => panic!("short token expected"),
        };
        llcs_short(a.chars().count(), b, 0, &map)
    }

    #[test]
    fn test_short_kernel_matches_reference() {
        let cases = [
            ("surgeo", "surgery"),
            ("surgeo", "survey"),
            ("surgeo", "insurgence"),
            ("assurance", "insurgence"),
            ("abc", "abc"),
            ("abc", "xyz"),
            ("kitten", "sitting"),
            ("abcdefgh", "aceg"),
            ("banana", "bandana"),
        ];
        for (a, b) in cases {
            assert_eq!(llcs_of(a, b), lcs_reference(a, b), "llcs({a}, {b})");
        }
    }

    #[test]
    fn test_short_kernel_with_prefix_skip() {
        // Prefix handling must agree with the plain scan.
        let a = "prefix_abc";
        let b = "prefix_xbc";
        let p = common_prefix_len(a, b);
        assert_eq!(p, 7);
        let map = match AlphabetMap::build(a) {
            AlphabetMap::Bits(m) => m,
            _ => unreachable!(),
        };
        assert_eq!(
            llcs_short(a.chars().count(), b, p, &map),
            lcs_reference(a, b)
        );
    }

    #[test]
    fn test_word_sized_token_uses_full_mask() {
        let a: String = "abcdefghijklmnopqrstuvwxyzabcdef".into();
        assert_eq!(a.chars().count(), 32);
        let b = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(llcs_of(&a, b), lcs_reference(&a, b));
    }

    #[test]
    fn test_short_kernel_random_against_reference() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..300 {
            let m = rng.gen_range(1..=32);
            let n = rng.gen_range(1..=48);
            let a: String = (0..m).map(|_| rng.gen_range(b'a'..=b'e') as char).collect();
            let b: String = (0..n).map(|_| rng.gen_range(b'a'..=b'e') as char).collect();
            assert_eq!(llcs_of(&a, &b), lcs_reference(&a, &b), "llcs({a}, {b})");
        }
    }

    #[test]
    fn test_self_score_follows_formula() {
        let opts = options();
        for t in ["ab", "abc", "tolkien", "abcdefghij"] {
            let len = t.chars().count();
            let expected = len as f64 + opts.bonus_match_start * len as f64;
            let got = score_pair(t, t, &opts);
            assert!((got - expected).abs() < 1e-9, "score({t},{t}) = {got}");
        }
    }

    #[test]
    fn test_score_never_negative() {
        let opts = options();
        for (a, b) in [("abc", "xyz"), ("ab", "zzzz"), ("q", "q")] {
            assert!(score_pair(a, b, &opts) >= 0.0);
        }
    }

    #[test]
    fn test_size_guard_rejects() {
        let opts = options();
        // n > token_max_rel_size * m
        let long_b: String = std::iter::repeat('a').take(40).collect();
        assert_eq!(score_pair("abc", &long_b, &opts), 0.0);
        // n < token_min_rel_size * m
        assert_eq!(score_pair("abcdefgh", "abc", &opts), 0.0);
    }

    #[test]
    fn test_empty_tokens_score_zero() {
        let opts = options();
        assert_eq!(score_pair("", "abc", &opts), 0.0);
        assert_eq!(score_pair("abc", "", &opts), 0.0);
    }

    #[test]
    fn test_prefix_bonus_counts() {
        let opts = options();
        let with_prefix = score_pair("surge", "surgery", &opts);
        let without = score_pair("egrus", "surgery", &opts);
        assert!(with_prefix > without);
    }
}
