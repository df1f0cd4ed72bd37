//! Index build, append and upsert.

use std::collections::HashMap;

use serde_json::Value;

use crate::engine::core::SuggestEngine;
use crate::fields::extract::{collect_leaves, leaf_to_string};
use crate::fields::{extract_fields, FieldNode};
use crate::store::NgramStore;

/// One prepared record: the owned record value plus the token lists of
/// every declared field.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub item: Value,
    /// Per declared key, one entry per leaf reached by the key's path.
    pub fields: Vec<Vec<FieldNode>>,
    /// Original leaf strings per field, for the alias projection.
    pub raw_texts: Vec<Vec<String>>,
    /// First field's flattened normalised text; the sort tie-break.
    pub sort_key: String,
    pub id: Option<String>,
}

/// The indexed collection plus the id → slot map enabling upsert.
#[derive(Debug, Default)]
pub struct Index {
    pub records: Vec<IndexedRecord>,
    pub ids: HashMap<String, usize>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_indexed(&self) -> usize {
        self.records.len()
    }
}

impl SuggestEngine {
    /// Number of live indexed records.
    pub fn nb_indexed(&self) -> usize {
        self.index.nb_indexed()
    }

    /// Replace the attached collection. Reindexes now, or at the next
    /// search when `lazy` is set.
    pub fn set_source(&mut self, source: Vec<Value>) {
        self.source = source;
        self.dirty = true;
        if !self.options.lazy {
            self.ensure_index();
        }
    }

    /// Drop the collection and the index.
    pub fn clear(&mut self) {
        self.source.clear();
        self.index = Index::new();
        self.store = None;
        self.dirty = false;
        self.store_dirty = true;
    }

    /// Add one record. With an id extractor installed, a record whose id is
    /// already indexed replaces the entry in place; otherwise the record is
    /// appended.
    pub fn add(&mut self, record: Value) {
        self.ensure_index();
        self.source.push(record.clone());

        let prepared = self.prepare_record(record);
        match prepared.id.clone() {
            Some(id) => {
                if let Some(&slot) = self.index.ids.get(&id) {
                    self.index.records[slot] = prepared;
                    // Stale store entries for the replaced record force a
                    // rebuild before the next pre-filtered search.
                    self.store_dirty = true;
                    log::debug!("upserted record id {id} at slot {slot}");
                } else {
                    let slot = self.index.records.len();
                    self.index.ids.insert(id, slot);
                    self.append_record(prepared);
                }
            }
            None => self.append_record(prepared),
        }
    }

    fn append_record(&mut self, prepared: IndexedRecord) {
        let slot = self.index.records.len();
        if let Some(store) = self.store.as_mut() {
            if !self.store_dirty {
                store.add_record(slot, &prepared);
            }
        }
        self.index.records.push(prepared);
    }

    /// Rebuild whatever is stale: the index from the source, then the
    /// n-gram store from the index.
    pub(crate) fn ensure_index(&mut self) {
        if self.dirty {
            self.build_index_from_source();
            self.dirty = false;
            self.store_dirty = true;
        }
        if self.options.use_index_store && self.store_dirty {
            self.store = Some(NgramStore::build(&self.index.records));
            self.store_dirty = false;
        }
    }

    fn build_index_from_source(&mut self) {
        let mut index = Index::new();
        let records = std::mem::take(&mut self.source);
        for record in &records {
            let prepared = self.prepare_record(record.clone());
            if let Some(id) = prepared.id.clone() {
                if let Some(&slot) = index.ids.get(&id) {
                    index.records[slot] = prepared;
                    continue;
                }
                index.ids.insert(id, index.records.len());
            }
            index.records.push(prepared);
        }
        self.source = records;
        log::info!("indexed {} records", index.records.len());
        self.index = index;
    }

    /// Extract fields, raw texts and the sort key from one record.
    pub(crate) fn prepare_record(&self, record: Value) -> IndexedRecord {
        let paths: Vec<_> = self.keys.iter().map(|k| k.path.clone()).collect();
        let fields = extract_fields(&record, &paths, &self.options);

        let raw_texts: Vec<Vec<String>> = paths
            .iter()
            .map(|path| {
                collect_leaves(&record, path)
                    .into_iter()
                    .filter_map(leaf_to_string)
                    .collect()
            })
            .collect();

        let sort_key = fields
            .first()
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|n| n.fused_text())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let id = self.identify.as_ref().and_then(|f| f(&record));

        IndexedRecord {
            item: record,
            fields,
            raw_texts,
            sort_key,
            id,
        }
    }
}
