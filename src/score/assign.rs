//! 1-to-1 assignment of query tokens to field tokens.
//!
//! Builds the full pairwise score matrix, thresholds each row relative to
//! its own best, then solves the maximum-sum injective assignment (rows may
//! also be skipped) by depth-first search memoised on `(depth, used_mask)`.

use std::collections::HashMap;

use crate::alphabet::WORD_BITS;
use crate::engine::config::SearchOptions;
use crate::score::kernel::score_pair;

/// Result of pairing query tokens with field tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch {
    /// For each query token, the index of the matched field token, or -1.
    pub pairs: Vec<isize>,
    /// Total score of the chosen assignment.
    pub score: f64,
}

impl TokenMatch {
    fn empty(rows: usize) -> Self {
        Self {
            pairs: vec![-1; rows],
            score: 0.0,
        }
    }
}

/// Pair each token of `a` with at most one token of `b`, maximising the sum
/// of pairwise scores.
pub fn match_tokens(a: &[String], b: &[String], options: &SearchOptions) -> TokenMatch {
    // The used-column bitmask is one machine word wide.
    let rows = a.len().min(WORD_BITS);
    let cols = b.len().min(WORD_BITS);
    if rows == 0 || cols == 0 {
        return TokenMatch::empty(a.len());
    }
    if a.len() > WORD_BITS || b.len() > WORD_BITS {
        log::debug!(
            "assignment truncated to {WORD_BITS} tokens per side ({} x {})",
            a.len(),
            b.len()
        );
    }

    // Fewer rows keep the search shallow; flip when a is the larger side.
    let flipped = rows > cols;
    let matrix = if flipped {
        build_matrix(&b[..cols], &a[..rows], options)
    } else {
        build_matrix(&a[..rows], &b[..cols], options)
    };

    let solved = solve(&matrix);
    let mut result = TokenMatch::empty(a.len());
    result.score = solved.score;
    if flipped {
        for (j, &i) in solved.pairs.iter().enumerate() {
            if i >= 0 {
                result.pairs[i as usize] = j as isize;
            }
        }
    } else {
        result.pairs[..solved.pairs.len()].copy_from_slice(&solved.pairs);
    }
    result
}

/// Pairwise score matrix with per-row relative thresholding: an entry
/// survives only when it reaches both `minimum_match` and
/// `thresh_relative_to_best` of its row's best.
fn build_matrix(rows: &[String], cols: &[String], options: &SearchOptions) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|a| {
            let mut row: Vec<f64> = cols.iter().map(|b| score_pair(a, b, options)).collect();
            let best = row.iter().cloned().fold(0.0f64, f64::max);
            let floor = options.minimum_match.max(options.thresh_relative_to_best * best);
            for sc in row.iter_mut() {
                if *sc < floor {
                    *sc = 0.0;
                }
            }
            row
        })
        .collect()
}

fn solve(matrix: &[Vec<f64>]) -> TokenMatch {
    let rows = matrix.len();

    // Shortcut: no positive entry at all.
    let positive_rows: Vec<usize> = (0..rows)
        .filter(|&i| matrix[i].iter().any(|&sc| sc > 0.0))
        .collect();
    if positive_rows.is_empty() {
        return TokenMatch::empty(rows);
    }

    // Shortcut: a single contested row takes its best column directly.
    if positive_rows.len() == 1 {
        let i = positive_rows[0];
        let (j, &sc) = matrix[i]
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.partial_cmp(y.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("row is non-empty");
        let mut result = TokenMatch::empty(rows);
        result.pairs[i] = j as isize;
        result.score = sc;
        return result;
    }

    let mut memo: HashMap<(usize, u32), (f64, isize)> = HashMap::new();
    let score = dfs(matrix, 0, 0, &mut memo);

    // Walk the cache from the root, re-applying each decision.
    let mut pairs = vec![-1isize; rows];
    let mut used = 0u32;
    for (i, pair) in pairs.iter_mut().enumerate() {
        let &(_, j) = memo.get(&(i, used)).expect("cache covers the chosen path");
        if j >= 0 {
            *pair = j;
            used |= 1 << j as u32;
        }
    }

    TokenMatch { pairs, score }
}

/// Best achievable score assigning rows `depth..` with `used` columns
/// already taken. Each memo entry also records the column chosen at that
/// node (or -1 for a skip), which is what reconstruction follows.
fn dfs(
    matrix: &[Vec<f64>],
    depth: usize,
    used: u32,
    memo: &mut HashMap<(usize, u32), (f64, isize)>,
) -> f64 {
    if depth == matrix.len() {
        return 0.0;
    }
    if let Some(&(score, _)) = memo.get(&(depth, used)) {
        return score;
    }

    // Skipping this row is always an option.
    let mut best = dfs(matrix, depth + 1, used, memo);
    let mut best_col = -1isize;

    for (j, &sc) in matrix[depth].iter().enumerate() {
        if sc <= 0.0 || used & (1 << j as u32) != 0 {
            continue;
        }
        let total = sc + dfs(matrix, depth + 1, used | (1 << j as u32), memo);
        if total > best {
            best = total;
            best_col = j as isize;
        }
    }

    memo.insert((depth, used), (best, best_col));
    best
}
