//! Packed kernel: several query tokens scored against one field token in a
//! single bit-parallel pass.
//!
//! The group's gate mask is ANDed into both addends of the row update so a
//! carry can never leave one packed token's bit range and corrupt its
//! neighbour's lane.

use crate::alphabet::{low_mask, shr_safe, AlphabetMap, PackGroup};
use crate::engine::config::SearchOptions;
use crate::score::kernel::{common_prefix_len, score_formula, size_guard};

/// Score every token of `group` against the field token `b`, writing one
/// score per packed slot into `out`.
///
/// `out` must hold exactly `group.slots()` entries.
pub fn score_pack(group: &PackGroup, b: &str, options: &SearchOptions, out: &mut [f64]) {
    debug_assert_eq!(out.len(), group.slots());

    let map = match &group.map {
        AlphabetMap::Bits(mask) => mask,
        AlphabetMap::Positions(_) => {
            // Long tokens never share a group; nothing sensible to do here.
            for slot in out.iter_mut() {
                *slot = 0.0;
            }
            return;
        }
    };

    let gate = group.gate;
    let mut s: u32 = !0;
    for ch in b.chars() {
        let u = s & map.get(ch);
        s = ((s & gate).wrapping_add(u & gate)) | s.wrapping_sub(u);
    }
    s = !s;

    let n = b.chars().count();
    for (k, token) in group.tokens.iter().enumerate() {
        let m = token.chars().count();
        if n == 0 || !size_guard(m, n, options) {
            out[k] = 0.0;
            continue;
        }
        let offset = group.offsets[k] as usize;
        let sk = shr_safe(s, offset) & low_mask(m);

        let prefix = common_prefix_len(token, b);
        let llcs = if prefix == m.min(n) {
            prefix
        } else {
            // The low `prefix` bits are the characters the prefix already
            // accounts for; count only the rises above them.
            prefix + shr_safe(sk, prefix).count_ones() as usize
        };
        out[k] = score_formula(m, n, llcs, prefix, options);
    }
}
