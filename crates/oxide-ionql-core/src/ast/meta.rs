//! Metadata attached to AST nodes.

use super::types::SqlDataType;
use crate::lexer::Span;
use crate::value::Value;

/// Tag of [`Meta::SourceLocation`].
pub const SOURCE_LOCATION_TAG: &str = "$source_location";
/// Tag of [`Meta::LegacyLogicalNot`].
pub const LEGACY_LOGICAL_NOT_TAG: &str = "$legacy_logical_not";
/// Tag of [`Meta::IsImplicitJoin`].
pub const IS_IMPLICIT_JOIN_TAG: &str = "$is_implicit_join";
/// Tag of [`Meta::IsCountStar`].
pub const IS_COUNT_STAR_TAG: &str = "$is_count_star";
/// Tag of [`Meta::IsSyntheticName`].
pub const IS_SYNTHETIC_NAME_TAG: &str = "$is_synthetic_name";
/// Tag of [`Meta::StaticType`].
pub const STATIC_TYPE_TAG: &str = "$static_type";

/// Where a node came from in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl From<Span> for SourceLocation {
    fn from(span: Span) -> Self {
        Self {
            line: span.line,
            column: span.column,
            length: span.length,
        }
    }
}

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    SourceLocation(SourceLocation),
    /// The enclosing `NOT` came from `NOT IN`, `NOT LIKE`, `NOT BETWEEN`
    /// or `IS NOT`.
    LegacyLogicalNot,
    /// The join had no `ON` condition.
    IsImplicitJoin,
    /// The aggregate was written `COUNT(*)`.
    IsCountStar,
    /// The name was generated rather than written by the user.
    IsSyntheticName,
    /// A type annotation added by later passes.
    StaticType(SqlDataType),
    /// Metadata with no registered decoder, kept verbatim.
    Opaque { tag: String, value: Value },
}

impl Meta {
    /// Returns the tag identifying this entry.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::SourceLocation(_) => SOURCE_LOCATION_TAG,
            Self::LegacyLogicalNot => LEGACY_LOGICAL_NOT_TAG,
            Self::IsImplicitJoin => IS_IMPLICIT_JOIN_TAG,
            Self::IsCountStar => IS_COUNT_STAR_TAG,
            Self::IsSyntheticName => IS_SYNTHETIC_NAME_TAG,
            Self::StaticType(_) => STATIC_TYPE_TAG,
            Self::Opaque { tag, .. } => tag,
        }
    }

    /// Returns false for entries the wire format rebuilds from structure
    /// (negation sugar, implicit joins) or deliberately drops (synthetic
    /// names).
    #[must_use]
    pub const fn should_serialize(&self) -> bool {
        !matches!(
            self,
            Self::LegacyLogicalNot | Self::IsImplicitJoin | Self::IsSyntheticName
        )
    }
}

/// An ordered collection of metadata, at most one entry per tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaContainer {
    entries: Vec<Meta>,
}

impl MetaContainer {
    /// Creates an empty container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a container holding only a source location.
    #[must_use]
    pub fn located(span: Span) -> Self {
        let mut metas = Self::new();
        metas.add(Meta::SourceLocation(span.into()));
        metas
    }

    /// Adds an entry, replacing any existing entry with the same tag in
    /// place.
    pub fn add(&mut self, meta: Meta) {
        match self.entries.iter_mut().find(|m| m.tag() == meta.tag()) {
            Some(existing) => *existing = meta,
            None => self.entries.push(meta),
        }
    }

    /// Builder form of [`MetaContainer::add`].
    #[must_use]
    pub fn with(mut self, meta: Meta) -> Self {
        self.add(meta);
        self
    }

    /// Returns a copy with every entry of `other` added.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for meta in &other.entries {
            out.add(meta.clone());
        }
        out
    }

    /// Returns the entry with the given tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Meta> {
        self.entries.iter().find(|m| m.tag() == tag)
    }

    /// Returns true if an entry with the given tag exists.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Removes and returns the entry with the given tag.
    pub fn remove(&mut self, tag: &str) -> Option<Meta> {
        let idx = self.entries.iter().position(|m| m.tag() == tag)?;
        Some(self.entries.remove(idx))
    }

    /// Returns the source location, if recorded.
    #[must_use]
    pub fn source_location(&self) -> Option<SourceLocation> {
        self.entries.iter().find_map(|m| match m {
            Meta::SourceLocation(loc) => Some(*loc),
            _ => None,
        })
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Meta> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the container has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if at least one entry should be written to the wire.
    #[must_use]
    pub fn has_serializable(&self) -> bool {
        self.entries.iter().any(Meta::should_serialize)
    }
}

impl FromIterator<Meta> for MetaContainer {
    fn from_iter<I: IntoIterator<Item = Meta>>(iter: I) -> Self {
        let mut metas = Self::new();
        for meta in iter {
            metas.add(meta);
        }
        metas
    }
}
