//! Abstract syntax tree for queries, data manipulation and definition
//! statements.
//!
//! Every node is a [`Node`] pairing its payload with a [`MetaContainer`].
//! Structural equality ignores metadata.

mod expression;
mod meta;
mod node;
mod statement;
mod types;

pub use expression::{
    ArityError, CaseSensitivity, Expr, ExprKind, NAryOp, PathStep, PathStepKind,
    ScopeQualifier, SeqKind, SetQuantifier, StructField, TypedOp, Walk, WhenClause,
};
pub use meta::{
    Meta, MetaContainer, SourceLocation, IS_COUNT_STAR_TAG, IS_IMPLICIT_JOIN_TAG,
    IS_SYNTHETIC_NAME_TAG, LEGACY_LOGICAL_NOT_TAG, SOURCE_LOCATION_TAG, STATIC_TYPE_TAG,
};
pub use node::{Node, SymbolicName};
pub use statement::{
    Assignment, DataManipulation, DmlOp, FromSource, FromSourceKind, GroupBy, GroupByItem,
    GroupingStrategy, JoinOp, Projection, Select, SelectListItem,
};
pub use types::{DataType, SqlDataType};
