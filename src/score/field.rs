//! Per-field score composition: best-per-slot tracking, the
//! distance-weighted order bonus and the fused fallback pass.

use crate::engine::config::SearchOptions;
use crate::fields::FieldNode;
use crate::query::QueryCore;
use crate::score::{kernel, packed};

/// Score one field leaf against a query, updating the query's per-record
/// scratch (`score_item` slots and `fused_score`) along the way.
pub fn score_field(options: &SearchOptions, node: &FieldNode, query: &mut QueryCore) -> f64 {
    let mut field_score = 0.0;

    if options.score_per_token && !query.groups.is_empty() && !node.tokens.is_empty() {
        field_score = score_field_tokens(options, node, query);
    }

    if (options.score_test_fused || !options.score_per_token) && !query.fused.is_empty() {
        let joined = node.fused_text();
        let mut fused = kernel::score_map(&query.fused, &joined, &query.fused_map, options);
        if options.score_per_token {
            // A fused match cannot be out of order.
            fused += options.bonus_token_order;
        }
        if fused > query.fused_score {
            query.fused_score = fused;
        }
        if fused > field_score {
            field_score = fused;
        }
    }

    field_score
}

/// The token-wise pass: for every pack group, find the best-scoring field
/// token per slot, then accumulate slot scores plus order bonuses.
fn score_field_tokens(options: &SearchOptions, node: &FieldNode, query: &mut QueryCore) -> f64 {
    let mut field_score = 0.0;
    let mut last_index: isize = -1;

    let QueryCore {
        groups, pack_buf, ..
    } = query;

    for group in groups.iter_mut() {
        let slots = group.slots();
        for k in 0..slots {
            group.score_field[k] = 0.0;
            group.field_pos[k] = 0;
        }

        if group.is_single() {
            for (i, token) in node.tokens.iter().enumerate() {
                let sc = kernel::score_map(&group.tokens[0], token, &group.map, options);
                update_best(group, 0, sc, i, options);
            }
        } else {
            pack_buf.resize(slots, 0.0);
            for (i, token) in node.tokens.iter().enumerate() {
                packed::score_pack(group, token, options, &mut pack_buf[..slots]);
                for k in 0..slots {
                    let sc = pack_buf[k];
                    update_best(group, k, sc, i, options);
                }
            }
        }

        for k in 0..slots {
            let sc = group.score_field[k];
            field_score += sc;

            // In-order consecutive slots earn a distance-weighted bonus;
            // empty matches do not move the order cursor.
            if sc > options.minimum_match {
                let this_index = group.field_pos[k] as isize;
                let d = this_index - last_index;
                let mut bonus = options.bonus_token_order / (1.0 + d.unsigned_abs() as f64);
                if d > 0 {
                    bonus *= 2.0;
                }
                field_score += bonus;
                last_index = this_index;
            }

            if sc > group.score_item[k] {
                group.score_item[k] = sc;
            }
        }
    }

    field_score
}

/// Keep the better score per slot; a near-tie moves the slot to the
/// later-indexed field token so consecutive slots can win the order bonus.
#[inline]
fn update_best(
    group: &mut crate::alphabet::PackGroup,
    k: usize,
    sc: f64,
    index: usize,
    options: &SearchOptions,
) {
    let best = group.score_field[k];
    if sc > best
        || (sc > options.minimum_match
            && best - sc < options.bonus_token_order
            && group.field_pos[k] < index)
    {
        group.score_field[k] = sc;
        group.field_pos[k] = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryCore;

    fn options() -> SearchOptions {
        SearchOptions::default()
    }

    fn node(tokens: &[&str]) -> FieldNode {
        FieldNode {
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            has_acronym: false,
        }
    }

    #[test]
    fn test_exact_token_scores_best() {
        let opts = options();
        let mut q = QueryCore::build(&opts, "surgery");
        let strong = score_field(&opts, &node(&["surgery"]), &mut q);
        q.reset_item();
        let weak = score_field(&opts, &node(&["survey"]), &mut q);
        assert!(strong > weak);
        assert!(weak > 0.0);
    }

    #[test]
    fn test_order_bonus_rewards_in_order_fields() {
        let opts = options();
        let mut q = QueryCore::build(&opts, "john doe");
        let in_order = score_field(&opts, &node(&["john", "doe"]), &mut q);
        q.reset_item();
        let reversed = score_field(&opts, &node(&["doe", "john"]), &mut q);
        assert!(in_order > reversed, "{in_order} <= {reversed}");
    }

    #[test]
    fn test_score_item_tracks_best_across_nodes() {
        let opts = options();
        let mut q = QueryCore::build(&opts, "alpha beta");
        q.reset_item();
        score_field(&opts, &node(&["alpha"]), &mut q);
        score_field(&opts, &node(&["beta"]), &mut q);
        let total = q.item_score();
        assert!(total > 0.0);
        // Both slots contributed even though they matched different nodes.
        let slot_sum: f64 = q.groups.iter().flat_map(|g| g.score_item.iter()).sum();
        assert!((total - slot_sum).abs() < 1e-9);
    }

    #[test]
    fn test_fused_pass_catches_joined_words() {
        let opts = SearchOptions {
            score_test_fused: true,
            ..options()
        };
        // "oldman" as a query token is too long relative to either field
        // token, so only the fused pass can see the match.
        let mut q = QueryCore::build(&opts, "oldman");
        let sc = score_field(&opts, &node(&["old", "man"]), &mut q);
        assert!(sc > 0.0);
        assert!(q.fused_score > 0.0);
    }

    #[test]
    fn test_fused_only_mode() {
        let opts = SearchOptions {
            score_per_token: false,
            ..options()
        };
        let mut q = QueryCore::build(&opts, "old man");
        let sc = score_field(&opts, &node(&["oldman"]), &mut q);
        assert!(sc > 0.0);
    }

    #[test]
    fn test_empty_node_scores_zero() {
        let opts = options();
        let mut q = QueryCore::build(&opts, "anything");
        assert_eq!(score_field(&opts, &node(&[]), &mut q), 0.0);
    }
}
