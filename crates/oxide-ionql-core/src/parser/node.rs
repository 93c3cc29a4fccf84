//! The intermediate parse tree.
//!
//! The parser builds a uniform tree of [`ParseNode`]s that stays close to
//! the token stream. [`super::convert`] then projects it onto the typed
//! AST.

use crate::lexer::{Span, Token, TokenKind};
use crate::value::Value;

/// Parse tree node shapes.
///
/// The comment on each variant gives the token it carries and its
/// children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseKind {
    /// Literal, Ion literal, `NULL`, `MISSING` or identifier token.
    Atom,
    /// `?` token whose value is the parameter number.
    Parameter,
    /// `@`; child: identifier atom.
    LocalsFirst,
    /// Operator token; child: operand.
    Unary,
    /// Operator token; children: left, right.
    Binary,
    /// `BETWEEN` or `LIKE ... ESCAPE`; children: three operands.
    Ternary,
    /// `IS`/`IS NOT` token; children: operand, type.
    IsType,
    /// `CAST`; children: operand, type.
    Cast,
    /// Type name token carrying the canonical name; children: argument atoms.
    Type,
    /// Function name token; children: arguments.
    Call,
    /// Aggregate name token; child: argument.
    CallAgg,
    /// Aggregate name token; child: argument.
    CallDistinctAgg,
    /// `COUNT(*)`; no children.
    CallAggWildcard,
    /// Children: root, then path steps.
    Path,
    /// `.name` or `."name"`; identifier token, no children.
    PathField,
    /// `[e]`; child: index.
    PathIndex,
    /// `[*]`
    PathWildcard,
    /// `.*`
    PathUnpivot,
    /// Children: items.
    List,
    /// Children: items.
    Bag,
    /// Children: items.
    Sexp,
    /// Children: members.
    Struct,
    /// Children: key, value.
    Member,
    /// Children: value, whens, optional else.
    SimpleCase,
    /// Children: whens, optional else.
    SearchedCase,
    /// Children: condition, result.
    When,
    /// Child: default.
    Else,
    /// `SELECT`/`PIVOT` token; children: projection, then clauses.
    Select,
    /// Children: select items.
    SelectList,
    /// Child: value.
    SelectValue,
    /// Children: value, key.
    PivotProjection,
    /// Child: projection.
    Distinct,
    /// Child: path whose trailing `.*` was removed.
    ProjectAll,
    /// Lone `*` in a select list.
    Star,
    /// Alias token; child: aliased node.
    AsAlias,
    /// Alias token; child: aliased node.
    AtAlias,
    /// Alias token; child: aliased node.
    ByAlias,
    /// Child: source tree.
    From,
    /// Child: expression.
    Unpivot,
    /// Children: left, right, optional condition.
    InnerJoin,
    /// Children: left, right, optional condition.
    LeftJoin,
    /// Children: left, right, optional condition.
    RightJoin,
    /// Children: left, right, optional condition.
    OuterJoin,
    /// Child: condition.
    Where,
    /// Children: group items, then optional group name.
    Group,
    /// Children: group items, then optional group name.
    GroupPartial,
    /// Name token.
    GroupName,
    /// Child: condition.
    Having,
    /// Child: limit.
    Limit,
    /// Children: operation, optional from, optional where.
    Dml,
    /// Children: target, values.
    Insert,
    /// Children: target, value, optional position.
    InsertValue,
    /// Children: assignments.
    Set,
    /// Children: target, value.
    Assignment,
    /// Child: target.
    Remove,
    /// No children.
    Delete,
    /// Table name token.
    CreateTable,
    /// Table name token.
    DropTable,
    /// Table name token; children: keys.
    CreateIndex,
    /// Table name token; child: index name atom.
    DropIndex,
}

/// A parse tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub kind: ParseKind,
    pub token: Option<Token>,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    /// Creates a node.
    #[must_use]
    pub const fn new(kind: ParseKind, token: Option<Token>, children: Vec<Self>) -> Self {
        Self {
            kind,
            token,
            children,
        }
    }

    /// Creates a leaf node for a token.
    #[must_use]
    pub const fn leaf(kind: ParseKind, token: Token) -> Self {
        Self::new(kind, Some(token), Vec::new())
    }

    /// Creates an atom carrying a synthesized symbol literal, as used for
    /// `TRIM` specifications and `EXTRACT` date parts.
    #[must_use]
    pub fn symbol_atom(name: &str, span: Span) -> Self {
        Self::leaf(
            ParseKind::Atom,
            Token::new(TokenKind::Literal, Some(Value::symbol(name)), span),
        )
    }

    /// Returns the token's span, or the first child's.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.token
            .as_ref()
            .map(|t| t.span)
            .or_else(|| self.children.first().and_then(Self::span))
    }
}
