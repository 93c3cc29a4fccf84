//! Query, data manipulation and FROM-source AST types.

use super::expression::{Expr, SetQuantifier};
use super::node::{Node, SymbolicName};

/// A FROM-clause source node.
pub type FromSource = Node<FromSourceKind>;

/// A `SELECT` or `PIVOT` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub quantifier: SetQuantifier,
    pub projection: Projection,
    pub from: FromSource,
    pub where_clause: Option<Expr>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Expr>,
    pub limit: Option<Expr>,
}

impl Select {
    /// Creates a query with only the mandatory clauses.
    #[must_use]
    pub const fn new(projection: Projection, from: FromSource) -> Self {
        Self {
            quantifier: SetQuantifier::All,
            projection,
            from,
            where_clause: None,
            group_by: None,
            having: None,
            limit: None,
        }
    }

    /// Returns true for `PIVOT` queries.
    #[must_use]
    pub const fn is_pivot(&self) -> bool {
        matches!(self.projection, Projection::Pivot { .. })
    }
}

/// What a query produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT a, b AS c, t.*`
    List(Vec<SelectListItem>),
    /// `SELECT VALUE e`
    Value(Expr),
    /// `PIVOT value AT key`
    Pivot { value: Expr, key: Expr },
}

/// One item of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectListItem {
    Expr {
        expr: Expr,
        alias: Option<SymbolicName>,
    },
    /// `path.*`
    ProjectAll(Expr),
    /// A lone `*`.
    Star,
}

/// `GROUP BY` or `GROUP PARTIAL BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingStrategy {
    Full,
    Partial,
}

/// The grouping clause.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub strategy: GroupingStrategy,
    pub items: Vec<GroupByItem>,
    /// `GROUP AS name`
    pub group_name: Option<SymbolicName>,
}

/// One grouping key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByItem {
    pub expr: Expr,
    pub alias: Option<SymbolicName>,
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinOp {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinOp {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Inner => "inner_join",
            Self::Left => "left_join",
            Self::Right => "right_join",
            Self::Outer => "outer_join",
        }
    }

    /// Looks up a wire symbol.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "inner_join" => Some(Self::Inner),
            "left_join" => Some(Self::Left),
            "right_join" => Some(Self::Right),
            "outer_join" => Some(Self::Outer),
            _ => None,
        }
    }
}

/// FROM-source payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSourceKind {
    /// `e [AS a] [AT i] [BY b]`
    Expr {
        expr: Expr,
        alias: Option<SymbolicName>,
        at: Option<SymbolicName>,
        by: Option<SymbolicName>,
    },
    /// `UNPIVOT e [AS a] [AT i] [BY b]`
    Unpivot {
        expr: Expr,
        alias: Option<SymbolicName>,
        at: Option<SymbolicName>,
        by: Option<SymbolicName>,
    },
    /// Joins nest to the left: `a, b, c` is `join(join(a, b), c)`.
    Join {
        op: JoinOp,
        left: Box<FromSource>,
        right: Box<FromSource>,
        condition: Expr,
    },
}

/// A data manipulation statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DataManipulation {
    pub op: DmlOp,
    pub from: Option<FromSource>,
    pub where_clause: Option<Expr>,
}

/// The operation a DML statement performs.
#[derive(Debug, Clone, PartialEq)]
pub enum DmlOp {
    /// `INSERT INTO target values`
    Insert { target: Expr, values: Expr },
    /// `INSERT INTO target VALUE v [AT pos]`
    InsertValue {
        target: Expr,
        value: Expr,
        position: Option<Expr>,
    },
    /// `SET a = 1, b = 2`
    Set(Vec<Assignment>),
    /// `REMOVE target`
    Remove(Expr),
    Delete,
}

/// `target = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expr,
    pub value: Expr,
}
