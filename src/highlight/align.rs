//! Smith–Waterman–Gotoh local alignment with affine gaps, used to compute
//! highlight spans.
//!
//! Only equal characters may align (scoring is LCS-like); the DP keeps a
//! full direction table for traceback plus O(n) rolling value rows. The
//! traceback merges matched runs separated by gaps no wider than
//! `highlight_bridge_gap`.

use crate::engine::config::SearchOptions;
use crate::normalize::is_separator;
use crate::types::Span;

/// Match reward.
const WM: f64 = 100.0;
/// Gap-open penalty.
const WO: f64 = -10.0;
/// Gap-extend penalty.
const WE: f64 = -1.0;

const DIR_STOP: u8 = 0;
const DIR_DIAG: u8 = 1;
const DIR_LEFT: u8 = 2;
const DIR_UP: u8 = 3;

/// Align query token `a` against field text `b` and return the matched
/// spans over `b`, in increasing position order.
pub fn align(a: &str, b: &str, options: &SearchOptions) -> Vec<Span> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return Vec::new();
    }

    // Optionally strip the shared prefix; it is matched by construction
    // and re-attached after the DP.
    let prefix = if options.highlight_prefix {
        a_chars
            .iter()
            .zip(b_chars.iter())
            .take_while(|(x, y)| x == y)
            .count()
    } else {
        0
    };
    if prefix > 0 && prefix == a_chars.len().min(b_chars.len()) {
        return vec![Span::new(0, prefix)];
    }

    let mut spans = align_dp(&a_chars[prefix..], &b_chars[prefix..], options);
    for span in spans.iter_mut() {
        span.start += prefix;
        span.end += prefix;
    }
    if prefix > 0 {
        match spans.first_mut() {
            Some(first) if first.start == prefix => *first = first.widened_to(0),
            _ => spans.insert(0, Span::new(0, prefix)),
        }
    }
    spans
}

fn align_dp(a: &[char], b: &[char], options: &SearchOptions) -> Vec<Span> {
    let m = a.len();
    let n = b.len();
    if m == 0 || n == 0 {
        return Vec::new();
    }

    let acronym = options.score_acronym;
    let sep = options.token_sep.as_str();

    // Direction table, (m+1) x (n+1); rolling rows for the value and the
    // two gap states.
    let mut dir = vec![DIR_STOP; (m + 1) * (n + 1)];
    let mut v_prev = vec![0.0f64; n + 1];
    let mut v_cur = vec![0.0f64; n + 1];
    let mut gap_b = vec![f64::NEG_INFINITY; n + 1];

    let mut best = 0.0f64;
    let mut best_i = 0usize;
    let mut best_j = 0usize;

    for i in 1..=m {
        let mut gap_a = f64::NEG_INFINITY;
        for j in 1..=n {
            // Alignment is only possible on equal characters; an acronym
            // query aligns cheaply with token initials.
            let diag = if a[i - 1] == b[j - 1] {
                let mut sc = v_prev[j - 1] + WM;
                if acronym {
                    if i == 1 || is_separator(a[i - 2], sep) {
                        sc += WM;
                    }
                    if j == 1 || is_separator(b[j - 2], sep) {
                        sc += WM;
                    }
                }
                sc
            } else {
                f64::NEG_INFINITY
            };

            gap_a = (v_cur[j - 1] + WO).max(gap_a + WE);
            gap_b[j] = (v_prev[j] + WO).max(gap_b[j] + WE);

            let mut value = 0.0;
            let mut direction = DIR_STOP;
            if diag > value {
                value = diag;
                direction = DIR_DIAG;
            }
            if gap_a > value {
                value = gap_a;
                direction = DIR_LEFT;
            }
            if gap_b[j] > value {
                value = gap_b[j];
                direction = DIR_UP;
            }

            v_cur[j] = value;
            dir[i * (n + 1) + j] = direction;
            if value > best {
                best = value;
                best_i = i;
                best_j = j;
            }
        }
        std::mem::swap(&mut v_prev, &mut v_cur);
        v_cur[0] = 0.0;
    }

    if best <= 0.0 {
        return Vec::new();
    }

    traceback(&dir, n, best_i, best_j, options.highlight_bridge_gap)
}

/// Walk the direction table from the best cell back to a STOP, recording
/// matched runs over `b`. Non-diagonal stretches wider than `bridge_gap`
/// close the current run.
fn traceback(
    dir: &[u8],
    n: usize,
    mut i: usize,
    mut j: usize,
    bridge_gap: usize,
) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut open: Option<Span> = None;
    let mut gap = 0usize;

    while i > 0 && j > 0 {
        match dir[i * (n + 1) + j] {
            DIR_DIAG => {
                match open.take() {
                    None => open = Some(Span::unit(j - 1)),
                    Some(run) => {
                        if gap > bridge_gap {
                            spans.push(run);
                            open = Some(Span::unit(j - 1));
                        } else {
                            open = Some(run.widened_to(j - 1));
                        }
                    }
                }
                gap = 0;
                i -= 1;
                j -= 1;
            }
            DIR_LEFT => {
                gap += 1;
                j -= 1;
            }
            DIR_UP => {
                gap += 1;
                i -= 1;
            }
            _ => break,
        }
    }
    if let Some(run) = open {
        spans.push(run);
    }

    spans.reverse();
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SearchOptions {
        SearchOptions::default()
    }

    #[test]
    fn test_exact_match_single_span() {
        let spans = align("john", "john", &options());
        assert_eq!(spans, vec![Span::new(0, 4)]);
    }

    #[test]
    fn test_substring_match() {
        let spans = align("doe", "doering", &options());
        assert_eq!(spans, vec![Span::new(0, 3)]);
    }

    #[test]
    fn test_small_gap_is_bridged() {
        // Default bridge gap of 2 swallows the single mismatch.
        let spans = align("doe", "dxoe", &options());
        assert_eq!(spans, vec![Span::new(0, 4)]);
    }

    #[test]
    fn test_wide_gap_splits_spans() {
        let opts = SearchOptions {
            highlight_bridge_gap: 0,
            ..options()
        };
        let spans = align("ab", "axxxb", &opts);
        assert_eq!(spans, vec![Span::new(0, 1), Span::new(4, 5)]);
    }

    #[test]
    fn test_no_match_no_spans() {
        assert!(align("abc", "xyz", &options()).is_empty());
        assert!(align("", "abc", &options()).is_empty());
        assert!(align("abc", "", &options()).is_empty());
    }

    #[test]
    fn test_prefix_strip_reattaches() {
        let opts = SearchOptions {
            highlight_prefix: true,
            ..options()
        };
        let spans = align("surge", "surgery", &opts);
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert!(spans.iter().any(|s| s.end >= 5));
    }

    #[test]
    fn test_acronym_alignment_prefers_initials() {
        let opts = SearchOptions {
            score_acronym: true,
            ..options()
        };
        // The initials of "john ronald doe" should attract the acronym.
        let spans = align("jrd", "john ronald doe", &opts);
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        assert!(starts.contains(&0));
        assert!(starts.contains(&5));
        assert!(starts.contains(&12));
    }
}
