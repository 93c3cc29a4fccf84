//! AST to symbolic expression.

use super::tags::{AST, EXP, META, ROOT, TERM, VERSION};
use super::AstVersion;
use crate::ast::{
    DataManipulation, DataType, DmlOp, Expr, ExprKind, FromSource, FromSourceKind, GroupBy,
    GroupingStrategy, Meta, MetaContainer, NAryOp, PathStep, PathStepKind, Projection,
    ScopeQualifier, Select, SelectListItem, SetQuantifier, SymbolicName, TypedOp, WhenClause,
    IS_COUNT_STAR_TAG, IS_IMPLICIT_JOIN_TAG, LEGACY_LOGICAL_NOT_TAG,
};
use crate::value::Value;

/// Writes expressions in one protocol version.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    version: AstVersion,
}

impl Serializer {
    #[must_use]
    pub const fn new(version: AstVersion) -> Self {
        Self { version }
    }

    /// Serializes `expr`, adding the envelope in V1.
    #[must_use]
    pub fn serialize(&self, expr: &Expr) -> Value {
        let root = self.expr(expr);
        match self.version {
            AstVersion::V0 => root,
            AstVersion::V1 => Value::tagged(
                AST,
                [
                    Value::tagged(VERSION, [Value::int(self.version.number())]),
                    Value::tagged(ROOT, [root]),
                ],
            ),
        }
    }

    /// Wraps a node body with whatever metadata the version can carry.
    fn wrap(&self, body: Value, metas: &MetaContainer) -> Value {
        match self.version {
            AstVersion::V0 => match metas.source_location() {
                Some(loc) => Value::tagged(
                    META,
                    [
                        body,
                        Value::Struct(vec![
                            ("line".to_string(), Value::from(loc.line as i64)),
                            ("column".to_string(), Value::from(loc.column as i64)),
                        ]),
                    ],
                ),
                None => body,
            },
            AstVersion::V1 => {
                let entries: Vec<Value> = metas
                    .iter()
                    .filter(|m| m.should_serialize())
                    .map(encode_meta)
                    .collect();
                if entries.is_empty() {
                    body
                } else {
                    Value::tagged(
                        TERM,
                        [Value::tagged(EXP, [body]), Value::tagged(META, entries)],
                    )
                }
            }
        }
    }

    fn expr(&self, expr: &Expr) -> Value {
        let body = self.expr_body(expr);
        self.wrap(body, &expr.metas)
    }

    fn exprs<'a>(&self, exprs: impl IntoIterator<Item = &'a Expr>) -> Vec<Value> {
        exprs.into_iter().map(|e| self.expr(e)).collect()
    }

    fn expr_body(&self, expr: &Expr) -> Value {
        match &expr.kind {
            ExprKind::Literal(value) => Value::tagged("lit", [value.clone()]),
            ExprKind::Missing => Value::tagged("missing", []),
            ExprKind::Id { name, case, scope } => {
                let name = Value::symbol(name.as_str());
                let case = Value::symbol(case.as_str());
                match self.version {
                    AstVersion::V0 => {
                        let id = Value::tagged("id", [name, case]);
                        match scope {
                            ScopeQualifier::Unqualified => id,
                            ScopeQualifier::LocalsFirst => Value::tagged("@", [id]),
                        }
                    }
                    AstVersion::V1 => {
                        Value::tagged("id", [name, case, Value::symbol(scope.as_str())])
                    }
                }
            }
            ExprKind::Parameter(index) => {
                Value::tagged("parameter", [Value::from(*index as i64)])
            }
            ExprKind::NAry { op, args } => self.nary(*op, args, &expr.metas),
            ExprKind::CallAgg {
                func,
                quantifier,
                arg,
            } => {
                let name = Value::symbol(func.name());
                if self.version == AstVersion::V0 && expr.metas.contains(IS_COUNT_STAR_TAG) {
                    Value::tagged("call_agg_wildcard", [name])
                } else {
                    Value::tagged(
                        "call_agg",
                        [name, Value::symbol(quantifier.as_str()), self.expr(arg)],
                    )
                }
            }
            ExprKind::Typed { op, expr, ty } => {
                Value::tagged(op.symbol(), [self.expr(expr), data_type(ty)])
            }
            ExprKind::Path { root, steps } => {
                let mut items = vec![self.expr(root)];
                items.extend(steps.iter().map(|s| self.path_step(s)));
                Value::tagged("path", items)
            }
            ExprKind::SimpleCase {
                value,
                whens,
                default,
            } => {
                let mut items = vec![self.expr(value)];
                items.extend(self.case_arms(whens, default.as_deref()));
                Value::tagged("simple_case", items)
            }
            ExprKind::SearchedCase { whens, default } => {
                Value::tagged("searched_case", self.case_arms(whens, default.as_deref()))
            }
            ExprKind::Struct(fields) => Value::tagged(
                "struct",
                fields
                    .iter()
                    .map(|f| Value::tagged("member", [self.expr(&f.name), self.expr(&f.value)])),
            ),
            ExprKind::Seq { kind, items } => Value::tagged(kind.symbol(), self.exprs(items)),
            ExprKind::Select(select) => self.select(select),
            ExprKind::Dml(dml) => self.dml(dml),
            ExprKind::CreateTable { name } => Value::tagged("create_table", [raw_name(name)]),
            ExprKind::DropTable { name } => Value::tagged("drop_table", [raw_name(name)]),
            ExprKind::CreateIndex { table, keys } => Value::tagged(
                "create_index",
                [raw_name(table), Value::tagged("keys", self.exprs(keys))],
            ),
            ExprKind::DropIndex { table, index } => {
                Value::tagged("drop_index", [raw_name(table), self.expr(index)])
            }
        }
    }

    /// Writes an operator application, restoring `not_in`, `not_like`,
    /// `not_between` and `is_not` from the legacy negation marker.
    fn nary(&self, op: NAryOp, args: &[Expr], metas: &MetaContainer) -> Value {
        if op == NAryOp::Not && metas.contains(LEGACY_LOGICAL_NOT_TAG) {
            if let [inner] = args {
                match &inner.kind {
                    ExprKind::NAry {
                        op: inner_op,
                        args: inner_args,
                    } => {
                        if let Some(tag) = inner_op.negated_symbol() {
                            return Value::tagged(tag, self.exprs(inner_args));
                        }
                    }
                    ExprKind::Typed {
                        op: TypedOp::Is,
                        expr,
                        ty,
                    } => return Value::tagged("is_not", [self.expr(expr), data_type(ty)]),
                    _ => {}
                }
            }
        }

        if op == NAryOp::Call {
            if let Some((callee, rest)) = args.split_first() {
                let mut items = vec![Value::symbol(callee_name(callee))];
                items.extend(self.exprs(rest));
                return Value::tagged("call", items);
            }
        }
        Value::tagged(op.symbol(), self.exprs(args))
    }

    fn path_step(&self, step: &PathStep) -> Value {
        let body = match &step.kind {
            PathStepKind::Expr { index, case } => Value::tagged(case.as_str(), [self.expr(index)]),
            PathStepKind::Wildcard => Value::tagged("path_wildcard", []),
            PathStepKind::Unpivot => Value::tagged("path_unpivot", []),
        };
        self.wrap(body, &step.metas)
    }

    fn case_arms(&self, whens: &[WhenClause], default: Option<&Expr>) -> Vec<Value> {
        let mut items: Vec<Value> = whens
            .iter()
            .map(|w| Value::tagged("when", [self.expr(&w.condition), self.expr(&w.result)]))
            .collect();
        if let Some(default) = default {
            items.push(Value::tagged("else", [self.expr(default)]));
        }
        items
    }

    fn select(&self, select: &Select) -> Value {
        let projection = match &select.projection {
            Projection::Pivot { value, key } => {
                Value::tagged("member", [self.expr(key), self.expr(value)])
            }
            Projection::List(items) => {
                let items = items.iter().map(|item| match item {
                    SelectListItem::Expr { expr, alias: None } => self.expr(expr),
                    SelectListItem::Expr {
                        expr,
                        alias: Some(alias),
                    } => Value::tagged("as", [raw_name(alias), self.expr(expr)]),
                    SelectListItem::ProjectAll(expr) => {
                        Value::tagged("project_all", [self.expr(expr)])
                    }
                    SelectListItem::Star => Value::tagged("star", []),
                });
                project(select.quantifier, Value::tagged("list", items))
            }
            Projection::Value(expr) => project(
                select.quantifier,
                Value::tagged("value", [self.expr(expr)]),
            ),
        };

        let mut clauses = vec![
            projection,
            Value::tagged("from", [self.from_source(&select.from)]),
        ];
        if let Some(cond) = &select.where_clause {
            clauses.push(Value::tagged("where", [self.expr(cond)]));
        }
        if let Some(group) = &select.group_by {
            clauses.push(self.group_by(group));
        }
        if let Some(having) = &select.having {
            clauses.push(Value::tagged("having", [self.expr(having)]));
        }
        if let Some(limit) = &select.limit {
            clauses.push(Value::tagged("limit", [self.expr(limit)]));
        }
        let tag = if select.is_pivot() { "pivot" } else { "select" };
        Value::tagged(tag, clauses)
    }

    fn group_by(&self, group: &GroupBy) -> Value {
        let items = group.items.iter().map(|item| match &item.alias {
            Some(alias) => Value::tagged("as", [raw_name(alias), self.expr(&item.expr)]),
            None => self.expr(&item.expr),
        });
        let mut args = vec![Value::tagged("items", items)];
        if let Some(name) = &group.group_name {
            args.push(Value::tagged("name", [raw_name(name)]));
        }
        let tag = match group.strategy {
            GroupingStrategy::Full => "group",
            GroupingStrategy::Partial => "group_partial",
        };
        Value::tagged(tag, args)
    }

    /// Writes a source as `(by b (at i (as a e)))`, omitting absent aliases.
    /// An unaliased source sharing its expression's metadata is written as
    /// the expression alone.
    fn from_source(&self, source: &FromSource) -> Value {
        if let FromSourceKind::Expr {
            expr,
            alias: None,
            at: None,
            by: None,
        } = &source.kind
        {
            if source.metas == expr.metas {
                return self.expr(expr);
            }
        }
        let body = match &source.kind {
            FromSourceKind::Expr { expr, alias, at, by } => {
                aliased(self.expr(expr), alias.as_ref(), at.as_ref(), by.as_ref())
            }
            FromSourceKind::Unpivot { expr, alias, at, by } => aliased(
                Value::tagged("unpivot", [self.expr(expr)]),
                alias.as_ref(),
                at.as_ref(),
                by.as_ref(),
            ),
            FromSourceKind::Join {
                op,
                left,
                right,
                condition,
            } => {
                let mut args = vec![self.from_source(left), self.from_source(right)];
                if !source.metas.contains(IS_IMPLICIT_JOIN_TAG) {
                    args.push(self.expr(condition));
                }
                Value::tagged(op.symbol(), args)
            }
        };
        self.wrap(body, &source.metas)
    }

    fn dml(&self, dml: &DataManipulation) -> Value {
        let op = match &dml.op {
            DmlOp::Insert { target, values } => {
                Value::tagged("insert", [self.expr(target), self.expr(values)])
            }
            DmlOp::InsertValue {
                target,
                value,
                position,
            } => {
                let mut args = vec![self.expr(target), self.expr(value)];
                args.extend(position.iter().map(|p| self.expr(p)));
                Value::tagged("insert_value", args)
            }
            DmlOp::Set(assignments) => Value::tagged(
                "set",
                assignments.iter().map(|a| {
                    Value::tagged("assignment", [self.expr(&a.target), self.expr(&a.value)])
                }),
            ),
            DmlOp::Remove(target) => Value::tagged("remove", [self.expr(target)]),
            DmlOp::Delete => Value::tagged("delete", []),
        };
        let mut args = vec![op];
        if let Some(from) = &dml.from {
            args.push(Value::tagged("from", [self.from_source(from)]));
        }
        if let Some(cond) = &dml.where_clause {
            args.push(Value::tagged("where", [self.expr(cond)]));
        }
        Value::tagged("dml", args)
    }
}

fn project(quantifier: SetQuantifier, inner: Value) -> Value {
    let tag = match quantifier {
        SetQuantifier::All => "project",
        SetQuantifier::Distinct => "project_distinct",
    };
    Value::tagged(tag, [inner])
}

fn aliased(
    mut value: Value,
    alias: Option<&SymbolicName>,
    at: Option<&SymbolicName>,
    by: Option<&SymbolicName>,
) -> Value {
    for (tag, name) in [("as", alias), ("at", at), ("by", by)] {
        if let Some(name) = name {
            value = Value::tagged(tag, [raw_name(name), value]);
        }
    }
    value
}

fn raw_name(name: &SymbolicName) -> Value {
    Value::symbol(name.name())
}

/// A call's callee is an identifier; anything else is written by its
/// literal text, or as an empty name.
fn callee_name(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Id { name, .. } => name.clone(),
        ExprKind::Literal(value) => value.as_text().unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

fn data_type(ty: &DataType) -> Value {
    let mut items = vec![Value::symbol(ty.sql_type.name())];
    items.extend(ty.args.iter().map(|&n| Value::from(i64::from(n))));
    Value::tagged("type", items)
}

/// Encodes one V1 metadata entry as `(<tag> <payload>)`.
fn encode_meta(meta: &Meta) -> Value {
    let payload = match meta {
        Meta::SourceLocation(loc) => Value::Struct(vec![
            ("line_num".to_string(), Value::from(loc.line as i64)),
            ("char_offset".to_string(), Value::from(loc.column as i64)),
            ("length".to_string(), Value::from(loc.length as i64)),
        ]),
        Meta::LegacyLogicalNot
        | Meta::IsImplicitJoin
        | Meta::IsCountStar
        | Meta::IsSyntheticName => Value::Bool(true),
        Meta::StaticType(ty) => Value::symbol(ty.name()),
        Meta::Opaque { value, .. } => value.clone(),
    };
    Value::tagged(meta.tag(), [payload])
}
