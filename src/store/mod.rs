//! Optional n-gram inverted store used as a candidate pre-filter.
//!
//! Each indexed record emits a key set from every word of every leaf:
//! the word's first letter, ordered pairs from its first four letters and
//! ordered triples from its first six. At search time the query words emit
//! the same keys; records are ranked by how many keys they share with the
//! query and only the upper band survives as the candidate list.

use std::collections::{HashMap, HashSet};

use crate::engine::config::SearchOptions;
use crate::engine::indexing::IndexedRecord;
use crate::query::Query;

/// Inverted map from n-gram key to the record slots containing it.
#[derive(Debug, Default)]
pub struct NgramStore {
    keys: HashMap<String, Vec<u32>>,
}

impl NgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store over a full index.
    pub fn build(records: &[IndexedRecord]) -> Self {
        let mut store = Self::new();
        for (slot, record) in records.iter().enumerate() {
            store.add_record(slot, record);
        }
        log::info!(
            "n-gram store built: {} keys over {} records",
            store.keys.len(),
            records.len()
        );
        store
    }

    /// Emit and register the key set of one record.
    pub fn add_record(&mut self, slot: usize, record: &IndexedRecord) {
        let mut seen: HashSet<String> = HashSet::new();
        for field in &record.fields {
            for node in field {
                for word in &node.tokens {
                    emit_keys(word, &mut seen);
                }
            }
        }
        for key in seen {
            self.keys.entry(key).or_default().push(slot as u32);
        }
    }

    /// Candidate slots for a query, ranked by shared-key count and cut at
    /// `store_thresh` of the best count, at most `store_max_results`.
    pub fn candidates(&self, query: &Query, options: &SearchOptions) -> Vec<usize> {
        let mut query_keys: HashSet<String> = HashSet::new();
        for word in &query.core.tokens {
            emit_keys(word, &mut query_keys);
        }
        for child in query.children.iter().flatten() {
            for word in &child.tokens {
                emit_keys(word, &mut query_keys);
            }
        }

        let mut counts: HashMap<u32, u32> = HashMap::new();
        for key in &query_keys {
            if let Some(slots) = self.keys.get(key) {
                for &slot in slots {
                    *counts.entry(slot).or_insert(0) += 1;
                }
            }
        }
        if counts.is_empty() {
            return Vec::new();
        }

        let best = counts.values().copied().max().unwrap_or(0);
        let floor = (options.store_thresh * best as f64).ceil() as u32;
        let mut ranked: Vec<(u32, u32)> = counts
            .into_iter()
            .filter(|&(_, count)| count >= floor.max(1))
            .collect();
        // Count descending, slot ascending for a deterministic order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(options.store_max_results);

        log::debug!(
            "store narrowed to {} candidates (best key count {best})",
            ranked.len()
        );
        ranked.into_iter().map(|(slot, _)| slot as usize).collect()
    }
}

/// The key set of one word.
fn emit_keys(word: &str, out: &mut HashSet<String>) {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return;
    }

    out.insert(chars[0].to_string());

    let head4 = &chars[..chars.len().min(4)];
    for i in 0..head4.len() {
        for j in (i + 1)..head4.len() {
            out.insert([head4[i], head4[j]].iter().collect());
        }
    }

    let head6 = &chars[..chars.len().min(6)];
    for i in 0..head6.len() {
        for j in (i + 1)..head6.len() {
            for k in (j + 1)..head6.len() {
                out.insert([head6[i], head6[j], head6[k]].iter().collect());
            }
        }
    }
}
