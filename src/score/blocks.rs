//! Block-list LCS kernel for query tokens longer than the machine word.
//!
//! The DP row is kept as a sorted list of half-open `[start, end)` blocks;
//! each position inside a block is a column where the row rises one level.
//! A row update walks the character's position list and the old block list
//! together: a match inside an existing block changes nothing, a match in a
//! gap claims the next block's first position, and a match beyond every
//! block appends a new rise and bumps the global LCS length.

use crate::alphabet::{PositionList, POS_SENTINEL};

/// Half-open interval of rise positions in one row of the block-list LCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: u32,
    pub end: u32,
}

impl Block {
    const SENTINEL: Block = Block {
        start: POS_SENTINEL,
        end: POS_SENTINEL,
    };

    fn unit(pos: u32) -> Self {
        Block {
            start: pos,
            end: pos + 1,
        }
    }
}

/// Append a block, merging with the previous one when adjacent.
fn push_block(row: &mut Vec<Block>, block: Block) {
    if let Some(last) = row.last_mut() {
        if last.end == block.start {
            last.end = block.end;
            return;
        }
    }
    row.push(block);
}

/// LLCS of a long query token (alphabet `positions`) against `b`, with the
/// first `prefix` characters already matched.
///
/// Positions below `prefix` on either side are excluded from the scan; the
/// returned length is `prefix` plus the rises accumulated by the rows.
pub fn llcs_blocks(positions: &PositionList, b: &str, prefix: usize) -> usize {
    let mut row: Vec<Block> = vec![Block::SENTINEL];
    let mut llcs = 0usize;
    let min_pos = prefix as u32;

    for ch in b.chars().skip(prefix) {
        let Some(matches) = positions.positions(ch) else {
            continue;
        };

        let mut out: Vec<Block> = Vec::with_capacity((2 * row.len()).min(llcs + 2));
        let mut oi = 0usize;
        // Replacement for row[oi] once its first position has been claimed.
        let mut head: Option<Block> = None;
        let mut skip_until = 0u32;

        for &q in matches {
            if q == POS_SENTINEL {
                break;
            }
            if q < min_pos || q < skip_until {
                continue;
            }
            // Copy old blocks wholly before the match position.
            loop {
                let cur = head.unwrap_or(row[oi]);
                if cur.end <= q {
                    push_block(&mut out, cur);
                    head = None;
                    oi += 1;
                } else {
                    break;
                }
            }
            let cur = head.unwrap_or(row[oi]);
            if cur.start <= q {
                // Inside an existing block: this column already rises.
                continue;
            }
            // Match in the gap before `cur`: a new rise at q.
            push_block(&mut out, Block::unit(q));
            if cur.start == POS_SENTINEL {
                // Dominant match past every block.
                llcs += 1;
                skip_until = POS_SENTINEL;
            } else {
                // The claimed rise displaces the first position of `cur`;
                // later matches up to its end cannot improve this row.
                skip_until = cur.end;
                if cur.start + 1 == cur.end {
                    head = None;
                    oi += 1;
                } else {
                    head = Some(Block {
                        start: cur.start + 1,
                        end: cur.end,
                    });
                }
            }
        }

        if let Some(rest) = head {
            push_block(&mut out, rest);
            oi += 1;
        }
        while oi < row.len() {
            push_block(&mut out, row[oi]);
            oi += 1;
        }
        row = out;
    }

    llcs + prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::testutil::lcs_reference;

    fn llcs_of(a: &str, b: &str) -> usize {
        llcs_blocks(&PositionList::build(a), b, 0)
    }

    #[test]
    fn test_blocks_small_cases() {
        assert_eq!(llcs_of("abc", "abc"), 3);
        assert_eq!(llcs_of("abc", "xyz"), 0);
        assert_eq!(llcs_of("xaya", "aa"), 2);
        assert_eq!(llcs_of("banana", "bandana"), 6);
        assert_eq!(llcs_of("kitten", "sitting"), 4);
    }

    #[test]
    fn test_blocks_match_reference_on_word_boundary_sizes() {
        // 31, 32, 33, 64, 65 character tokens around the machine word.
        for m in [31usize, 32, 33, 64, 65] {
            let a: String = (0..m)
                .map(|i| (b'a' + (i % 5) as u8) as char)
                .collect();
            let b: String = (0..m + 3)
                .map(|i| (b'a' + ((i * 2) % 5) as u8) as char)
                .collect();
            assert_eq!(llcs_of(&a, &b), lcs_reference(&a, &b), "m = {m}");
        }
    }

    #[test]
    fn test_blocks_with_prefix() {
        let a = "prefixlongtokenwithmanycharacters";
        let b = "prefixlongtokenwithothercontent";
        let p = a
            .chars()
            .zip(b.chars())
            .take_while(|(x, y)| x == y)
            .count();
        let positions = PositionList::build(a);
        assert_eq!(llcs_blocks(&positions, b, p), lcs_reference(a, b));
    }

    #[test]
    fn test_blocks_prefix_excludes_early_positions() {
        // The 'a' at position 0 must not serve the suffix scan.
        let positions = PositionList::build("aba");
        assert_eq!(llcs_blocks(&positions, "aab", 1), 2);
    }

    #[test]
    fn test_blocks_random_against_reference() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0xb10c);
        for _ in 0..300 {
            let m = rng.gen_range(1..=70);
            let n = rng.gen_range(1..=70);
            let a: String = (0..m).map(|_| rng.gen_range(b'a'..=b'd') as char).collect();
            let b: String = (0..n).map(|_| rng.gen_range(b'a'..=b'd') as char).collect();
            assert_eq!(llcs_of(&a, &b), lcs_reference(&a, &b), "llcs({a}, {b})");
        }
    }

    #[test]
    fn test_blocks_random_with_prefix_against_reference() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0xfeed);
        for _ in 0..200 {
            let p = rng.gen_range(0..=6);
            let shared: String = (0..p).map(|_| rng.gen_range(b'a'..=b'c') as char).collect();
            let m = rng.gen_range(1..=40);
            let n = rng.gen_range(1..=40);
            let mut a = shared.clone();
            let mut b = shared;
            // Diverge immediately after the shared part so the common
            // prefix is exactly p.
            a.push('x');
            b.push('y');
            a.extend((0..m).map(|_| rng.gen_range(b'a'..=b'c') as char));
            b.extend((0..n).map(|_| rng.gen_range(b'a'..=b'c') as char));
            let positions = PositionList::build(&a);
            assert_eq!(
                llcs_blocks(&positions, &b, p),
                lcs_reference(&a, &b),
                "llcs({a}, {b}) prefix {p}"
            );
        }
    }
}
