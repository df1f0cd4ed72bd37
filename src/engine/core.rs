//! The engine struct and its constructor.

use std::sync::Arc;

use anyhow::Result;
use regex::Regex;
use serde_json::Value;

use crate::engine::config::{resolve_keys, FieldKey, SearchOptions};
use crate::engine::indexing::Index;
use crate::query::parser::build_tag_regex;
use crate::query::{parse_query, Query};
use crate::results::OutputMap;
use crate::store::NgramStore;

/// Extracts a stable id from a record, enabling upsert on `add`.
pub type IdentifyFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Record predicate consulted before a candidate is scored.
pub type FilterFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Approximate string-matching engine over an in-memory record collection.
///
/// A search is synchronous and runs to completion; the per-search scratch
/// lives inside the parsed [`Query`], so concurrent callers need one engine
/// instance each.
pub struct SuggestEngine {
    pub(crate) options: SearchOptions,
    pub(crate) keys: Vec<FieldKey>,
    /// Lowercased tag → key slot, in declared order.
    pub(crate) tags: Vec<(String, usize)>,
    pub(crate) tag_regex: Option<Regex>,
    /// The attached record collection, canonical for rebuilds.
    pub(crate) source: Vec<Value>,
    pub(crate) index: Index,
    pub(crate) store: Option<NgramStore>,
    pub(crate) identify: Option<IdentifyFn>,
    pub(crate) filter: Option<FilterFn>,
    pub(crate) output_map: OutputMap,
    /// The index no longer reflects the source; rebuilt at next search.
    pub(crate) dirty: bool,
    pub(crate) store_dirty: bool,
}

impl SuggestEngine {
    /// Create an engine from validated options. The initial `source` inside
    /// the options is attached; indexing happens now unless `lazy` is set.
    pub fn new(mut options: SearchOptions) -> Result<Self> {
        options.validate()?;
        let keys = resolve_keys(&options.keys)?;
        let tags: Vec<(String, usize)> = keys
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| key.tag.clone().map(|tag| (tag, slot)))
            .collect();
        let tag_regex = build_tag_regex(&tags);
        let source = std::mem::take(&mut options.source);
        let lazy = options.lazy;

        let mut engine = Self {
            options,
            keys,
            tags,
            tag_regex,
            source,
            index: Index::new(),
            store: None,
            identify: None,
            filter: None,
            output_map: OutputMap::Item,
            dirty: true,
            store_dirty: true,
        };
        if !lazy {
            engine.ensure_index();
        }
        Ok(engine)
    }

    /// Replace the configuration wholesale. Keys and ranges are
    /// re-validated; the index is rebuilt against the new options (at the
    /// next search when `lazy`). A non-empty `source` in the new options
    /// replaces the attached collection.
    pub fn set_options(&mut self, mut options: SearchOptions) -> Result<()> {
        options.validate()?;
        let keys = resolve_keys(&options.keys)?;
        let tags: Vec<(String, usize)> = keys
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| key.tag.clone().map(|tag| (tag, slot)))
            .collect();
        let tag_regex = build_tag_regex(&tags);

        let new_source = std::mem::take(&mut options.source);
        if !new_source.is_empty() {
            self.source = new_source;
        }
        self.options = options;
        self.keys = keys;
        self.tags = tags;
        self.tag_regex = tag_regex;
        self.dirty = true;
        if !self.options.lazy {
            self.ensure_index();
        }
        Ok(())
    }

    /// Install the id extractor. Existing entries are re-identified at the
    /// next rebuild.
    pub fn set_identify<F>(&mut self, f: F)
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.identify = Some(Arc::new(f));
        self.dirty = true;
    }

    /// Install a candidate filter consulted before scoring.
    pub fn set_filter<F>(&mut self, f: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
    }

    /// Install the output projection.
    pub fn set_output_map(&mut self, output_map: OutputMap) {
        self.output_map = output_map;
    }

    /// Parse a raw query against the declared tags.
    pub fn parse_query(&self, raw: &str) -> Query {
        parse_query(
            &self.options,
            &self.tags,
            self.tag_regex.as_ref(),
            self.keys.len(),
            raw,
        )
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn keys(&self) -> &[FieldKey] {
        &self.keys
    }
}

impl std::fmt::Debug for SuggestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestEngine")
            .field("nb_indexed", &self.index.records.len())
            .field("keys", &self.keys.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
