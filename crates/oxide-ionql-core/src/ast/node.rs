//! The generic node wrapper pairing a payload with metadata.

use super::meta::{Meta, MetaContainer, SourceLocation};
use crate::lexer::Span;

/// An AST node: a payload `kind` plus metadata.
///
/// Equality compares `kind` only.
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub kind: K,
    pub metas: MetaContainer,
}

impl<K> Node<K> {
    /// Creates a node without metadata.
    #[must_use]
    pub const fn new(kind: K) -> Self {
        Self {
            kind,
            metas: MetaContainer::new(),
        }
    }

    /// Creates a node carrying the given span as its source location.
    #[must_use]
    pub fn located(kind: K, span: Span) -> Self {
        Self {
            kind,
            metas: MetaContainer::located(span),
        }
    }

    /// Replaces the metadata, consuming the node.
    #[must_use]
    pub fn with_metas(mut self, metas: MetaContainer) -> Self {
        self.metas = metas;
        self
    }

    /// Adds one metadata entry, consuming the node.
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.metas.add(meta);
        self
    }

    /// Returns a copy of this node with different metadata.
    #[must_use]
    pub fn copy_with_metas(&self, metas: MetaContainer) -> Self
    where
        K: Clone,
    {
        Self {
            kind: self.kind.clone(),
            metas,
        }
    }

    /// Returns the recorded source location.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        self.metas.source_location()
    }

    /// Maps the payload, keeping the metadata.
    #[must_use]
    pub fn map<T>(self, f: impl FnOnce(K) -> T) -> Node<T> {
        Node {
            kind: f(self.kind),
            metas: self.metas,
        }
    }
}

impl<K: PartialEq> PartialEq for Node<K> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl<K> From<K> for Node<K> {
    fn from(kind: K) -> Self {
        Self::new(kind)
    }
}

/// A name in a position that is not an expression: aliases, function
/// names, table names.
pub type SymbolicName = Node<String>;

impl SymbolicName {
    /// Returns the name text.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.kind
    }
}
