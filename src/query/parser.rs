//! Free-form query parsing: splitting a raw query into a root segment and
//! per-tag child segments.
//!
//! Tag markers look like `title:`; the marker pattern is built from the
//! declared tag names with every regex metacharacter escaped, so a tag can
//! never produce a malformed pattern. A marker for an unknown tag simply
//! never matches and stays plain text.

use regex::Regex;

use crate::engine::config::SearchOptions;
use crate::query::{Query, QueryCore};

/// Build the marker pattern for a set of declared tags. Returns `None`
/// when no key carries a tag.
pub fn build_tag_regex(tags: &[(String, usize)]) -> Option<Regex> {
    if tags.is_empty() {
        return None;
    }
    let alternation = tags
        .iter()
        .map(|(tag, _)| regex::escape(tag))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b({alternation}):");
    // Escaped alternations of non-empty tags always compile.
    Regex::new(&pattern).ok()
}

/// Parse a raw query into a root query plus one child query per tagged
/// segment. `tags` maps each lowercased tag name to its key slot;
/// `nb_keys` sizes the children vector.
pub fn parse_query(
    options: &SearchOptions,
    tags: &[(String, usize)],
    tag_regex: Option<&Regex>,
    nb_keys: usize,
    raw: &str,
) -> Query {
    let mut children: Vec<Option<QueryCore>> = (0..nb_keys).map(|_| None).collect();

    let Some(re) = tag_regex else {
        return Query {
            core: QueryCore::build(options, raw),
            children,
        };
    };

    // Cut the query at each marker; the text before the first marker is
    // the root segment, every other span belongs to the marker before it.
    let mut segments: Vec<(Option<usize>, String)> = Vec::new();
    let mut cursor = 0usize;
    let mut current_slot: Option<usize> = None;
    for m in re.find_iter(raw) {
        segments.push((current_slot, raw[cursor..m.start()].to_string()));
        let tag_text = raw[m.start()..m.end() - 1].to_lowercase();
        current_slot = tags
            .iter()
            .find(|(tag, _)| *tag == tag_text)
            .map(|&(_, slot)| slot);
        cursor = m.end();
    }
    segments.push((current_slot, raw[cursor..].to_string()));

    let mut root_text = String::new();
    let mut child_texts: Vec<String> = vec![String::new(); nb_keys];
    for (slot, text) in segments {
        match slot {
            None => {
                if !root_text.is_empty() {
                    root_text.push(' ');
                }
                root_text.push_str(&text);
            }
            Some(idx) => {
                if !child_texts[idx].is_empty() {
                    child_texts[idx].push(' ');
                }
                child_texts[idx].push_str(&text);
            }
        }
    }

    for (idx, text) in child_texts.into_iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let core = QueryCore::build(options, &text);
        if !core.is_empty() {
            children[idx] = Some(core);
        }
    }

    Query {
        core: QueryCore::build(options, &root_text),
        children,
    }
}
