//! Expression AST types.

use thiserror::Error;

use super::node::{Node, SymbolicName};
use super::statement::{DataManipulation, DmlOp, FromSource, FromSourceKind, Projection, Select, SelectListItem};
use super::types::DataType;
use crate::value::Value;

/// An expression node.
pub type Expr = Node<ExprKind>;

/// A path step node.
pub type PathStep = Node<PathStepKind>;

/// Whether a name matches case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sensitive => "case_sensitive",
            Self::Insensitive => "case_insensitive",
        }
    }

    /// Looks up a wire symbol.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "case_sensitive" => Some(Self::Sensitive),
            "case_insensitive" => Some(Self::Insensitive),
            _ => None,
        }
    }

    /// Compares two names under this sensitivity. Insensitive comparison
    /// folds ASCII letters only, the same folding the lexer applies to
    /// keywords and identifiers.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            Self::Sensitive => a == b,
            Self::Insensitive => a.eq_ignore_ascii_case(b),
        }
    }
}

/// Where variable lookup starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeQualifier {
    Unqualified,
    /// Written `@name`.
    LocalsFirst,
}

impl ScopeQualifier {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unqualified => "unqualified",
            Self::LocalsFirst => "locals_first",
        }
    }

    /// Looks up a wire symbol.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "unqualified" => Some(Self::Unqualified),
            "locals_first" => Some(Self::LocalsFirst),
            _ => None,
        }
    }
}

/// `ALL` or `DISTINCT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SetQuantifier {
    #[default]
    All,
    Distinct,
}

impl SetQuantifier {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Distinct => "distinct",
        }
    }

    /// Looks up a wire symbol.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "distinct" => Some(Self::Distinct),
            _ => None,
        }
    }
}

/// Operators applied to a list of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NAryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Not,
    And,
    Or,
    Like,
    Between,
    In,
    StringConcat,
    /// Function call; the first operand is the function name.
    Call,
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl NAryOp {
    /// All operators, for table-driven lookups.
    pub const ALL: [Self; 25] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Like,
        Self::Between,
        Self::In,
        Self::StringConcat,
        Self::Call,
        Self::Union,
        Self::UnionAll,
        Self::Intersect,
        Self::IntersectAll,
        Self::Except,
        Self::ExceptAll,
    ];

    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::Like => "like",
            Self::Between => "between",
            Self::In => "in",
            Self::StringConcat => "||",
            Self::Call => "call",
            Self::Union => "union",
            Self::UnionAll => "union_all",
            Self::Intersect => "intersect",
            Self::IntersectAll => "intersect_all",
            Self::Except => "except",
            Self::ExceptAll => "except_all",
        }
    }

    /// Looks up an operator by wire symbol.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == s)
    }

    /// Returns the accepted operand count as `(min, max)`; `None` means
    /// unbounded.
    #[must_use]
    pub const fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Self::Add | Self::Sub => (1, Some(2)),
            Self::Not => (1, Some(1)),
            Self::And | Self::Or | Self::StringConcat => (2, None),
            Self::Like => (2, Some(3)),
            Self::Between => (3, Some(3)),
            Self::Call => (1, None),
            Self::Mul
            | Self::Div
            | Self::Mod
            | Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Lte
            | Self::Gt
            | Self::Gte
            | Self::In
            | Self::Union
            | Self::UnionAll
            | Self::Intersect
            | Self::IntersectAll
            | Self::Except
            | Self::ExceptAll => (2, Some(2)),
        }
    }

    /// Returns true if `count` operands are acceptable.
    #[must_use]
    pub const fn accepts(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        if count < min {
            return false;
        }
        match max {
            Some(max) => count <= max,
            None => true,
        }
    }

    /// Returns the operator written `NOT <op>` in source, if any.
    #[must_use]
    pub const fn negated_symbol(&self) -> Option<&'static str> {
        match self {
            Self::In => Some("not_in"),
            Self::Like => Some("not_like"),
            Self::Between => Some("not_between"),
            _ => None,
        }
    }
}

/// Operators taking an expression and a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedOp {
    Cast,
    Is,
}

impl TypedOp {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Cast => "cast",
            Self::Is => "is",
        }
    }
}

/// Kinds of sequence constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    List,
    Bag,
    Sexp,
}

impl SeqKind {
    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Bag => "bag",
            Self::Sexp => "sexp",
        }
    }

    /// Looks up a constructor name.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "list" => Some(Self::List),
            "bag" => Some(Self::Bag),
            "sexp" => Some(Self::Sexp),
            _ => None,
        }
    }
}

/// One `WHEN ... THEN ...` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

/// One `name: value` member of a struct constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: Expr,
    pub value: Expr,
}

/// Path step payloads.
#[derive(Debug, Clone)]
pub enum PathStepKind {
    /// `.name`, `."name"` or `[expr]`.
    Expr {
        index: Box<Expr>,
        case: CaseSensitivity,
    },
    /// `[*]`
    Wildcard,
    /// `.*`
    Unpivot,
}

impl PartialEq for PathStepKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Expr { index: a, case: ca },
                Self::Expr { index: b, case: cb },
            ) => {
                if ca != cb {
                    return false;
                }
                match (&a.kind, &b.kind) {
                    (
                        ExprKind::Literal(Value::String(x)),
                        ExprKind::Literal(Value::String(y)),
                    ) => ca.matches(x, y),
                    _ => a == b,
                }
            }
            (Self::Wildcard, Self::Wildcard) | (Self::Unpivot, Self::Unpivot) => true,
            _ => false,
        }
    }
}

/// Expression payloads.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Value),
    Missing,
    /// A variable reference.
    Id {
        name: String,
        case: CaseSensitivity,
        scope: ScopeQualifier,
    },
    /// A positional `?` parameter, numbered from 1.
    Parameter(usize),
    NAry {
        op: NAryOp,
        args: Vec<Expr>,
    },
    /// An aggregate call such as `SUM(DISTINCT x)`.
    CallAgg {
        func: SymbolicName,
        quantifier: SetQuantifier,
        arg: Box<Expr>,
    },
    Typed {
        op: TypedOp,
        expr: Box<Expr>,
        ty: DataType,
    },
    Path {
        root: Box<Expr>,
        steps: Vec<PathStep>,
    },
    SimpleCase {
        value: Box<Expr>,
        whens: Vec<WhenClause>,
        default: Option<Box<Expr>>,
    },
    SearchedCase {
        whens: Vec<WhenClause>,
        default: Option<Box<Expr>>,
    },
    Struct(Vec<StructField>),
    Seq {
        kind: SeqKind,
        items: Vec<Expr>,
    },
    Select(Box<Select>),
    Dml(Box<DataManipulation>),
    CreateTable {
        name: SymbolicName,
    },
    DropTable {
        name: SymbolicName,
    },
    CreateIndex {
        table: SymbolicName,
        keys: Vec<Expr>,
    },
    DropIndex {
        table: SymbolicName,
        index: Box<Expr>,
    },
}

impl PartialEq for ExprKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Missing, Self::Missing) => true,
            (
                Self::Id {
                    name: na,
                    case: ca,
                    scope: sa,
                },
                Self::Id {
                    name: nb,
                    case: cb,
                    scope: sb,
                },
            ) => ca == cb && sa == sb && ca.matches(na, nb),
            (Self::Parameter(a), Self::Parameter(b)) => a == b,
            (Self::NAry { op: oa, args: aa }, Self::NAry { op: ob, args: ab }) => {
                oa == ob && aa == ab
            }
            (
                Self::CallAgg {
                    func: fa,
                    quantifier: qa,
                    arg: aa,
                },
                Self::CallAgg {
                    func: fb,
                    quantifier: qb,
                    arg: ab,
                },
            ) => fa == fb && qa == qb && aa == ab,
            (
                Self::Typed {
                    op: oa,
                    expr: ea,
                    ty: ta,
                },
                Self::Typed {
                    op: ob,
                    expr: eb,
                    ty: tb,
                },
            ) => oa == ob && ea == eb && ta == tb,
            (Self::Path { root: ra, steps: sa }, Self::Path { root: rb, steps: sb }) => {
                ra == rb && sa == sb
            }
            (
                Self::SimpleCase {
                    value: va,
                    whens: wa,
                    default: da,
                },
                Self::SimpleCase {
                    value: vb,
                    whens: wb,
                    default: db,
                },
            ) => va == vb && wa == wb && da == db,
            (
                Self::SearchedCase {
                    whens: wa,
                    default: da,
                },
                Self::SearchedCase {
                    whens: wb,
                    default: db,
                },
            ) => wa == wb && da == db,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            (Self::Seq { kind: ka, items: ia }, Self::Seq { kind: kb, items: ib }) => {
                ka == kb && ia == ib
            }
            (Self::Select(a), Self::Select(b)) => a == b,
            (Self::Dml(a), Self::Dml(b)) => a == b,
            (Self::CreateTable { name: a }, Self::CreateTable { name: b })
            | (Self::DropTable { name: a }, Self::DropTable { name: b }) => a == b,
            (
                Self::CreateIndex { table: ta, keys: ka },
                Self::CreateIndex { table: tb, keys: kb },
            ) => ta == tb && ka == kb,
            (
                Self::DropIndex {
                    table: ta,
                    index: ia,
                },
                Self::DropIndex {
                    table: tb,
                    index: ib,
                },
            ) => ta == tb && ia == ib,
            _ => false,
        }
    }
}

/// An operator or data type used with the wrong number of arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{subject}' does not accept {found} arguments")]
pub struct ArityError {
    pub subject: String,
    pub found: usize,
}

impl Expr {
    /// A literal.
    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::new(ExprKind::Literal(value.into()))
    }

    /// A case-insensitive, unqualified variable reference.
    #[must_use]
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Id {
            name: name.into(),
            case: CaseSensitivity::Insensitive,
            scope: ScopeQualifier::Unqualified,
        })
    }

    /// An n-ary operator application.
    #[must_use]
    pub fn nary(op: NAryOp, args: Vec<Self>) -> Self {
        Self::new(ExprKind::NAry { op, args })
    }

    /// A function call.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(Self::id(name));
        all.extend(args);
        Self::nary(NAryOp::Call, all)
    }

    /// Returns the literal value, if this is a literal.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the operator and operands, if this is an n-ary node.
    #[must_use]
    pub fn as_nary(&self) -> Option<(NAryOp, &[Self])> {
        match &self.kind {
            ExprKind::NAry { op, args } => Some((*op, args.as_slice())),
            _ => None,
        }
    }

    /// Returns the direct child expressions in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Missing
            | ExprKind::Id { .. }
            | ExprKind::Parameter(_)
            | ExprKind::CreateTable { .. }
            | ExprKind::DropTable { .. } => {}
            ExprKind::NAry { args, .. } => out.extend(args),
            ExprKind::CallAgg { arg, .. } => out.push(arg.as_ref()),
            ExprKind::Typed { expr, .. } => out.push(expr.as_ref()),
            ExprKind::Path { root, steps } => {
                out.push(root.as_ref());
                for step in steps {
                    if let PathStepKind::Expr { index, .. } = &step.kind {
                        out.push(index.as_ref());
                    }
                }
            }
            ExprKind::SimpleCase {
                value,
                whens,
                default,
            } => {
                out.push(value.as_ref());
                push_whens(&mut out, whens, default.as_deref());
            }
            ExprKind::SearchedCase { whens, default } => {
                push_whens(&mut out, whens, default.as_deref());
            }
            ExprKind::Struct(fields) => {
                for field in fields {
                    out.push(&field.name);
                    out.push(&field.value);
                }
            }
            ExprKind::Seq { items, .. } => out.extend(items),
            ExprKind::Select(select) => push_select(&mut out, select),
            ExprKind::Dml(dml) => {
                match &dml.op {
                    DmlOp::Insert { target, values } => {
                        out.push(target);
                        out.push(values);
                    }
                    DmlOp::InsertValue {
                        target,
                        value,
                        position,
                    } => {
                        out.push(target);
                        out.push(value);
                        out.extend(position);
                    }
                    DmlOp::Set(assignments) => {
                        for a in assignments {
                            out.push(&a.target);
                            out.push(&a.value);
                        }
                    }
                    DmlOp::Remove(target) => out.push(target),
                    DmlOp::Delete => {}
                }
                if let Some(from) = &dml.from {
                    push_source(&mut out, from);
                }
                out.extend(&dml.where_clause);
            }
            ExprKind::CreateIndex { keys, .. } => out.extend(keys),
            ExprKind::DropIndex { index, .. } => out.push(index.as_ref()),
        }
        out
    }

    /// Iterates over this expression and every descendant, depth first,
    /// parents before children.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Checks operand counts of every n-ary node and argument counts of
    /// every data type in the tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in pre-order.
    pub fn validate_arity(&self) -> Result<(), ArityError> {
        for expr in self.walk() {
            match &expr.kind {
                ExprKind::NAry { op, args } if !op.accepts(args.len()) => {
                    return Err(ArityError {
                        subject: op.symbol().to_string(),
                        found: args.len(),
                    });
                }
                ExprKind::Typed { ty, .. } if !ty.is_valid() => {
                    return Err(ArityError {
                        subject: ty.sql_type.name().to_string(),
                        found: ty.args.len(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn push_whens<'a>(out: &mut Vec<&'a Expr>, whens: &'a [WhenClause], default: Option<&'a Expr>) {
    for when in whens {
        out.push(&when.condition);
        out.push(&when.result);
    }
    out.extend(default);
}

fn push_select<'a>(out: &mut Vec<&'a Expr>, select: &'a Select) {
    match &select.projection {
        Projection::List(items) => {
            for item in items {
                match item {
                    SelectListItem::Expr { expr, .. } | SelectListItem::ProjectAll(expr) => {
                        out.push(expr);
                    }
                    SelectListItem::Star => {}
                }
            }
        }
        Projection::Value(expr) => out.push(expr),
        Projection::Pivot { value, key } => {
            out.push(value);
            out.push(key);
        }
    }
    push_source(out, &select.from);
    out.extend(&select.where_clause);
    if let Some(group) = &select.group_by {
        out.extend(group.items.iter().map(|item| &item.expr));
    }
    out.extend(&select.having);
    out.extend(&select.limit);
}

fn push_source<'a>(out: &mut Vec<&'a Expr>, source: &'a FromSource) {
    match &source.kind {
        FromSourceKind::Expr { expr, .. } | FromSourceKind::Unpivot { expr, .. } => out.push(expr),
        FromSourceKind::Join {
            left,
            right,
            condition,
            ..
        } => {
            push_source(out, left);
            push_source(out, right);
            out.push(condition);
        }
    }
}

/// Pre-order iterator returned by [`Expr::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.stack.pop()?;
        self.stack.extend(expr.children().into_iter().rev());
        Some(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::SqlDataType;
    use crate::lexer::Span;

    #[test]
    fn test_case_insensitive_id_equality() {
        assert_eq!(Expr::id("Foo"), Expr::id("fOO"));
        let sensitive = Expr::new(ExprKind::Id {
            name: "Foo".into(),
            case: CaseSensitivity::Sensitive,
            scope: ScopeQualifier::Unqualified,
        });
        let other = Expr::new(ExprKind::Id {
            name: "foo".into(),
            case: CaseSensitivity::Sensitive,
            scope: ScopeQualifier::Unqualified,
        });
        assert_ne!(sensitive, other);
        assert_ne!(sensitive, Expr::id("Foo"));
    }

    #[test]
    fn test_insensitive_match_folds_ascii_only() {
        let insensitive = CaseSensitivity::Insensitive;
        assert!(insensitive.matches("Order_Id", "ORDER_id"));
        assert!(insensitive.matches("caf\u{e9}", "CAF\u{e9}"));
        assert!(!insensitive.matches("\u{c9}t\u{e9}", "\u{e9}t\u{e9}"));
        assert!(!insensitive.matches("stra\u{df}e", "STRASSE"));
        assert!(!CaseSensitivity::Sensitive.matches("a", "A"));
    }

    #[test]
    fn test_path_step_equality() {
        let step = |s: &str, case| PathStepKind::Expr {
            index: Box::new(Expr::lit(Value::string(s))),
            case,
        };
        assert_eq!(
            step("Name", CaseSensitivity::Insensitive),
            step("name", CaseSensitivity::Insensitive)
        );
        assert_ne!(
            step("Name", CaseSensitivity::Sensitive),
            step("name", CaseSensitivity::Sensitive)
        );
        assert_ne!(PathStepKind::Wildcard, PathStepKind::Unpivot);
    }

    #[test]
    fn test_equality_ignores_metas() {
        let a = Expr::located(ExprKind::Literal(Value::int(1)), Span::new(1, 1, 1));
        assert_eq!(a, Expr::lit(1_i64));
    }

    #[test]
    fn test_nary_arity() {
        assert!(NAryOp::Sub.accepts(1));
        assert!(!NAryOp::Mul.accepts(1));
        assert!(NAryOp::And.accepts(5));
        assert!(!NAryOp::Between.accepts(2));
        assert!(NAryOp::Like.accepts(3));
        assert!(!NAryOp::Call.accepts(0));
    }

    #[test]
    fn test_symbols_round_trip() {
        for op in NAryOp::ALL {
            assert_eq!(NAryOp::from_symbol(op.symbol()), Some(op));
        }
    }

    #[test]
    fn test_walk_is_pre_order() {
        let e = Expr::nary(
            NAryOp::Add,
            vec![
                Expr::lit(1_i64),
                Expr::nary(NAryOp::Mul, vec![Expr::lit(2_i64), Expr::lit(3_i64)]),
            ],
        );
        let literals: Vec<i64> = e
            .walk()
            .filter_map(|x| x.as_literal().and_then(Value::as_i64))
            .collect();
        assert_eq!(literals, vec![1, 2, 3]);
        assert_eq!(e.walk().count(), 5);
    }

    #[test]
    fn test_validate_arity() {
        let good = Expr::nary(NAryOp::Eq, vec![Expr::id("a"), Expr::lit(1_i64)]);
        assert!(good.validate_arity().is_ok());

        let bad = Expr::nary(
            NAryOp::And,
            vec![good.clone(), Expr::nary(NAryOp::Between, vec![Expr::id("x")])],
        );
        let err = bad.validate_arity().unwrap_err();
        assert_eq!(err.subject, "between");
        assert_eq!(err.found, 1);

        let bad_type = Expr::new(ExprKind::Typed {
            op: TypedOp::Cast,
            expr: Box::new(Expr::id("x")),
            ty: DataType::with_args(SqlDataType::Integer, vec![4]),
        });
        assert!(bad_type.validate_arity().is_err());
    }

    #[test]
    fn test_call_helper() {
        let call = Expr::call("upper", vec![Expr::id("x")]);
        let (op, args) = call.as_nary().unwrap();
        assert_eq!(op, NAryOp::Call);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], Expr::id("UPPER"));
    }
}
