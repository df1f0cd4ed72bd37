//! The search loop: candidate narrowing, per-record composition, threshold
//! discipline and result selection.

use serde_json::{Map, Value};

use crate::engine::core::SuggestEngine;
use crate::engine::indexing::IndexedRecord;
use crate::fields::KeyPath;
use crate::fields::extract::collect_leaves;
use crate::query::Query;
use crate::results::{compare_results, OutputMap, SearchResult};
use crate::score::score_field;

impl SuggestEngine {
    /// Search the indexed collection, returning results in descending score
    /// order with an alphabetical tie-break.
    pub fn search(&mut self, raw: &str) -> Vec<SearchResult> {
        self.ensure_index();

        let mut query = self.parse_query(raw);
        if query.is_empty() || self.index.records.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<usize> = match self.store.as_ref() {
            Some(store) if self.options.use_index_store => {
                store.candidates(&query, &self.options)
            }
            _ => (0..self.index.records.len()).collect(),
        };

        // The inclusion floor only ever rises within one search.
        let mut thresh_include = self.options.thresh_include;
        let mut best_item_score = 0.0f64;
        let mut collected: Vec<(f64, usize, usize, usize)> = Vec::new();

        for slot in candidates {
            let record = &self.index.records[slot];
            if let Some(filter) = self.filter.as_ref() {
                if !filter(&record.item) {
                    continue;
                }
            }

            query.reset_item();
            let (best_field, match_index, sub_index) = score_record(self, record, &mut query);

            let item_score = if self.options.score_per_token {
                0.5 * best_field + 0.5 * query.item_score()
            } else {
                best_field
            };

            if item_score > best_item_score {
                best_item_score = item_score;
                let floor = item_score * self.options.thresh_relative_to_best;
                if floor > thresh_include {
                    thresh_include = floor;
                }
            }

            if item_score > thresh_include {
                let rounded =
                    (item_score / self.options.score_round).round() * self.options.score_round;
                collected.push((rounded, slot, match_index, sub_index));
                if self.options.max_inners > 0 && collected.len() >= self.options.max_inners {
                    log::debug!("max_inners cap reached at {} results", collected.len());
                    break;
                }
            }
        }

        let mut results: Vec<SearchResult> = collected
            .into_iter()
            .map(|(score, slot, match_index, sub_index)| {
                let record = &self.index.records[slot];
                SearchResult {
                    item: self.project(record),
                    score,
                    match_index,
                    sub_index,
                    sort_key: record.sort_key.clone(),
                }
            })
            .collect();

        results.sort_by(compare_results);
        if self.options.output_limit > 0 {
            results.truncate(self.options.output_limit);
        }

        log::debug!(
            "search {:?}: {} results, best {best_item_score:.2}",
            raw,
            results.len()
        );
        results
    }

    /// Render a record through the configured output projection.
    fn project(&self, record: &IndexedRecord) -> Value {
        match &self.output_map {
            OutputMap::Item => record.item.clone(),
            OutputMap::Alias => {
                let mut out = Map::new();
                for (slot, key) in self.keys.iter().enumerate() {
                    let Some(tag) = key.tag.as_ref() else { continue };
                    let joined = record.raw_texts[slot].join(&self.options.join_str);
                    out.insert(tag.clone(), Value::String(joined));
                }
                Value::Object(out)
            }
            OutputMap::Field(path) => match KeyPath::parse(path) {
                Ok(parsed) => collect_leaves(&record.item, &parsed)
                    .into_iter()
                    .next()
                    .cloned()
                    .unwrap_or(Value::Null),
                Err(_) => Value::Null,
            },
            OutputMap::Custom(f) => f(&record.item),
        }
    }
}

/// Score every field of one record: per-field best leaf, position decay,
/// tag sub-queries and the good-enough short-circuit.
fn score_record(
    engine: &SuggestEngine,
    record: &IndexedRecord,
    query: &mut Query,
) -> (f64, usize, usize) {
    let options = &engine.options;
    let mut best = 0.0f64;
    let mut match_index = 0usize;
    let mut sub_index = 0usize;
    let mut position_bonus = 1.0f64;

    for (field_index, field) in record.fields.iter().enumerate() {
        let mut field_best = 0.0f64;
        let mut node_best = 0usize;

        for (node_index, node) in field.iter().enumerate() {
            let mut node_score = score_field(options, node, &mut query.core);
            if let Some(child) = query.children[field_index].as_mut() {
                node_score += score_field(options, node, child);
            }
            if node_score > field_best {
                field_best = node_score;
                node_best = node_index;
            }
        }

        let field_score = field_best * (1.0 + position_bonus);
        position_bonus *= options.bonus_position_decay;

        if field_score > best {
            best = field_score;
            match_index = field_index;
            sub_index = node_best;
        }
        if field_score > options.field_good_enough {
            break;
        }
    }

    (best, match_index, sub_index)
}
