//! The wire tag table.
//!
//! Every tag a serialized AST may contain, with its argument count in each
//! protocol version and which arguments are nested nodes. The table is
//! built once on first use and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::AstVersion;

/// Envelope tag.
pub const AST: &str = "ast";
/// Envelope version entry.
pub const VERSION: &str = "version";
/// Envelope root entry.
pub const ROOT: &str = "root";
/// V0 location wrapper and V1 metadata list.
pub const META: &str = "meta";
/// V1 node wrapper.
pub const TERM: &str = "term";
/// V1 wrapped node.
pub const EXP: &str = "exp";

/// An inclusive argument count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    #[must_use]
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    #[must_use]
    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Returns true if `count` arguments are allowed.
    #[must_use]
    pub const fn accepts(&self, count: usize) -> bool {
        count >= self.min
            && match self.max {
                Some(max) => count <= max,
                None => true,
            }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Which arguments of a tag are nodes to be validated recursively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// Every argument is a node.
    Nodes,
    /// No argument is a node.
    Raw,
    /// The first `n` arguments are raw, the rest are nodes.
    Leading(usize),
    /// `meta`: a V0 location wrapper or a V1 metadata list.
    Meta,
    /// `term`: a V1 node wrapper.
    Term,
    /// Envelope tags, valid only at the top.
    Envelope,
}

/// A tag table entry.
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    pub tag: &'static str,
    pub v0: Option<Arity>,
    pub v1: Option<Arity>,
    pub shape: ArgShape,
}

impl TagSpec {
    /// Returns the arity in `version`, or `None` if the tag is not valid
    /// there.
    #[must_use]
    pub const fn arity(&self, version: AstVersion) -> Option<Arity> {
        match version {
            AstVersion::V0 => self.v0,
            AstVersion::V1 => self.v1,
        }
    }
}

const fn both(tags: &'static str, arity: Arity, shape: ArgShape) -> (&'static str, TagSpec) {
    (
        tags,
        TagSpec {
            tag: "",
            v0: Some(arity),
            v1: Some(arity),
            shape,
        },
    )
}

const fn v0_only(tags: &'static str, arity: Arity, shape: ArgShape) -> (&'static str, TagSpec) {
    (
        tags,
        TagSpec {
            tag: "",
            v0: Some(arity),
            v1: None,
            shape,
        },
    )
}

const fn v1_only(tags: &'static str, arity: Arity, shape: ArgShape) -> (&'static str, TagSpec) {
    (
        tags,
        TagSpec {
            tag: "",
            v0: None,
            v1: Some(arity),
            shape,
        },
    )
}

/// Table rows; the first field lists the space-separated tags sharing a
/// row.
const ROWS: &[(&str, TagSpec)] = &[
    v1_only("ast", Arity::exact(2), ArgShape::Envelope),
    v1_only("version root", Arity::exact(1), ArgShape::Envelope),
    (
        "meta",
        TagSpec {
            tag: "",
            v0: Some(Arity::exact(2)),
            v1: Some(Arity::at_least(0)),
            shape: ArgShape::Meta,
        },
    ),
    v1_only("term", Arity::range(1, 2), ArgShape::Term),
    v1_only("exp", Arity::exact(1), ArgShape::Nodes),
    both("lit", Arity::exact(1), ArgShape::Raw),
    both("missing", Arity::exact(0), ArgShape::Raw),
    (
        "id",
        TagSpec {
            tag: "",
            v0: Some(Arity::exact(2)),
            v1: Some(Arity::exact(3)),
            shape: ArgShape::Raw,
        },
    ),
    v0_only("@", Arity::exact(1), ArgShape::Nodes),
    both("parameter", Arity::exact(1), ArgShape::Raw),
    both("+ -", Arity::range(1, 2), ArgShape::Nodes),
    both(
        "* / % = <> < <= > >= in not_in",
        Arity::exact(2),
        ArgShape::Nodes,
    ),
    both("not", Arity::exact(1), ArgShape::Nodes),
    both("and or ||", Arity::at_least(2), ArgShape::Nodes),
    both("like not_like", Arity::range(2, 3), ArgShape::Nodes),
    both("between not_between", Arity::exact(3), ArgShape::Nodes),
    both(
        "union union_all intersect intersect_all except except_all",
        Arity::exact(2),
        ArgShape::Nodes,
    ),
    both("call", Arity::at_least(1), ArgShape::Leading(1)),
    both("call_agg", Arity::exact(3), ArgShape::Leading(2)),
    v0_only("call_agg_wildcard", Arity::exact(1), ArgShape::Raw),
    both("cast is is_not", Arity::exact(2), ArgShape::Nodes),
    both("type", Arity::range(1, 3), ArgShape::Raw),
    both("path", Arity::at_least(2), ArgShape::Nodes),
    both("case_sensitive case_insensitive", Arity::exact(1), ArgShape::Nodes),
    both("path_wildcard path_unpivot", Arity::exact(0), ArgShape::Raw),
    both("simple_case", Arity::at_least(2), ArgShape::Nodes),
    both("searched_case", Arity::at_least(1), ArgShape::Nodes),
    both("when", Arity::exact(2), ArgShape::Nodes),
    both("else", Arity::exact(1), ArgShape::Nodes),
    both("struct", Arity::at_least(0), ArgShape::Nodes),
    both("member", Arity::exact(2), ArgShape::Nodes),
    both("list bag sexp", Arity::at_least(0), ArgShape::Nodes),
    both("select pivot", Arity::range(2, 6), ArgShape::Nodes),
    both("project project_distinct", Arity::exact(1), ArgShape::Nodes),
    both("value project_all", Arity::exact(1), ArgShape::Nodes),
    both("star", Arity::exact(0), ArgShape::Raw),
    both("as at by", Arity::exact(2), ArgShape::Leading(1)),
    both("from", Arity::exact(1), ArgShape::Nodes),
    both(
        "inner_join left_join right_join outer_join",
        Arity::range(2, 3),
        ArgShape::Nodes,
    ),
    both("unpivot", Arity::exact(1), ArgShape::Nodes),
    both("where having limit", Arity::exact(1), ArgShape::Nodes),
    both("group group_partial", Arity::range(1, 2), ArgShape::Nodes),
    both("items", Arity::at_least(1), ArgShape::Nodes),
    both("name", Arity::exact(1), ArgShape::Raw),
    both("dml", Arity::range(1, 3), ArgShape::Nodes),
    both("insert", Arity::exact(2), ArgShape::Nodes),
    both("insert_value", Arity::range(2, 3), ArgShape::Nodes),
    both("set", Arity::at_least(1), ArgShape::Nodes),
    both("assignment", Arity::exact(2), ArgShape::Nodes),
    both("remove", Arity::exact(1), ArgShape::Nodes),
    both("delete", Arity::exact(0), ArgShape::Raw),
    both("create_table drop_table", Arity::exact(1), ArgShape::Raw),
    both("create_index", Arity::exact(2), ArgShape::Leading(1)),
    both("keys", Arity::at_least(1), ArgShape::Nodes),
    both("drop_index", Arity::exact(2), ArgShape::Leading(1)),
];

static TABLE: LazyLock<HashMap<&'static str, TagSpec>> = LazyLock::new(|| {
    ROWS.iter()
        .flat_map(|(tags, spec)| {
            tags.split_whitespace()
                .map(move |tag| (tag, TagSpec { tag, ..*spec }))
        })
        .collect()
});

/// Looks up a tag.
#[must_use]
pub fn lookup(tag: &str) -> Option<&'static TagSpec> {
    TABLE.get(tag)
}

/// Returns every tag valid in `version`, sorted.
#[must_use]
pub fn tags_in(version: AstVersion) -> Vec<&'static str> {
    let mut tags: Vec<_> = TABLE
        .values()
        .filter(|spec| spec.arity(version).is_some())
        .map(|spec| spec.tag)
        .collect();
    tags.sort_unstable();
    tags
}
