//! Dotted key paths with `*` wildcards.

use thiserror::Error;

/// One component of a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key into a record-like value (or a numeric index into an
    /// array when it parses as one).
    Key(String),
    /// `*`: branch over every element of an array or every value of a
    /// record-like value.
    Wildcard,
}

/// Error raised when a declared key path is syntactically malformed.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("invalid key path '{0}': empty segment")]
    EmptySegment(String),
}

/// A parsed dotted path such as `seg1.seg2.*.seg4`.
///
/// An optional leading `item.` or `root.` prefix is stripped; a path that is
/// empty after stripping addresses the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The path addressing the record itself.
    pub fn root() -> Self {
        Self {
            raw: String::new(),
            segments: Vec::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix("item.")
            .or_else(|| trimmed.strip_prefix("root."))
            .unwrap_or(trimmed);

        if stripped.is_empty() || stripped == "item" || stripped == "root" {
            return Ok(Self {
                raw: raw.to_string(),
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        for seg in stripped.split('.') {
            if seg.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            if seg == "*" {
                segments.push(PathSegment::Wildcard);
            } else {
                segments.push(PathSegment::Key(seg.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether the path addresses the record itself.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let p = KeyPath::parse("title").unwrap();
        assert_eq!(p.segments(), &[PathSegment::Key("title".into())]);
    }

    #[test]
    fn test_parse_nested_with_wildcard() {
        let p = KeyPath::parse("crew.*.name").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Key("crew".into()),
                PathSegment::Wildcard,
                PathSegment::Key("name".into()),
            ]
        );
    }

    #[test]
    fn test_item_prefix_stripped() {
        let p = KeyPath::parse("item.title").unwrap();
        assert_eq!(p.segments(), &[PathSegment::Key("title".into())]);
        assert!(KeyPath::parse("item").unwrap().is_root());
        assert!(KeyPath::parse("root").unwrap().is_root());
        assert!(KeyPath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(KeyPath::parse("a..b").is_err());
        assert!(KeyPath::parse(".a").is_err());
        assert!(KeyPath::parse("a.").is_err());
    }
}
