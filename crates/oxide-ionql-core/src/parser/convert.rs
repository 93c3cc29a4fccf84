//! Projection of the parse tree onto the AST.
//!
//! Every [`ParseKind`] is matched explicitly, so a new parse tree shape
//! does not compile until it is handled here. Shapes that the parser never
//! produces in a given position are reported as internal errors.

use super::node::{ParseKind, ParseNode};
use super::precedence::{is_negated, token_to_nary_op};
use crate::ast::{
    Assignment, CaseSensitivity, DataManipulation, DataType, DmlOp, Expr, ExprKind, FromSource,
    FromSourceKind, GroupBy, GroupByItem, GroupingStrategy, JoinOp, Meta, MetaContainer, NAryOp,
    PathStep, PathStepKind, Projection, ScopeQualifier, Select, SelectListItem, SeqKind,
    SetQuantifier, SqlDataType, StructField, SymbolicName, TypedOp, WhenClause,
};
use crate::error::{Error, InternalError, Result};
use crate::lexer::{Operator, Token, TokenKind};
use crate::value::Value;

/// Converts a parse tree into an expression.
///
/// # Errors
///
/// Returns [`Error::Internal`] if the tree has a shape the parser does not
/// build.
pub fn to_expr(node: ParseNode) -> Result<Expr> {
    let metas = located(&node);
    let ParseNode {
        kind,
        token,
        children,
    } = node;

    let expr_kind = match kind {
        ParseKind::Atom => atom(token)?,
        ParseKind::Parameter => {
            let index = token
                .as_ref()
                .and_then(|t| t.value.as_ref())
                .and_then(Value::as_i64)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| malformed("parameter without a number"))?;
            ExprKind::Parameter(index)
        }
        ParseKind::LocalsFirst => {
            let [name] = take(children, "locals-first reference")?;
            match atom(name.token)? {
                ExprKind::Id { name, case, .. } => ExprKind::Id {
                    name,
                    case,
                    scope: ScopeQualifier::LocalsFirst,
                },
                other => return Err(malformed(format!("'@' applied to {other:?}"))),
            }
        }
        ParseKind::Unary => {
            let [operand] = take(children, "unary operator")?;
            let op = match token.map(|t| t.kind) {
                Some(TokenKind::Operator(Operator::Not)) => NAryOp::Not,
                Some(TokenKind::Operator(Operator::Plus)) => NAryOp::Add,
                Some(TokenKind::Operator(Operator::Minus)) => NAryOp::Sub,
                other => return Err(malformed(format!("unary operator {other:?}"))),
            };
            ExprKind::NAry {
                op,
                args: vec![to_expr(operand)?],
            }
        }
        ParseKind::Binary | ParseKind::Ternary => return operator(token, children, metas),
        ParseKind::IsType => {
            let [operand, ty] = take(children, "IS")?;
            let negated = token.as_ref().is_some_and(|t| is_negated(&t.kind));
            let typed = Expr::new(ExprKind::Typed {
                op: TypedOp::Is,
                expr: Box::new(to_expr(operand)?),
                ty: data_type(ty)?,
            })
            .with_metas(metas.clone());
            return Ok(if negated { negate(typed, metas) } else { typed });
        }
        ParseKind::Cast => {
            let [operand, ty] = take(children, "CAST")?;
            ExprKind::Typed {
                op: TypedOp::Cast,
                expr: Box::new(to_expr(operand)?),
                ty: data_type(ty)?,
            }
        }
        ParseKind::Call => {
            let name = token.as_ref().ok_or_else(|| malformed("call without a name"))?;
            let mut args = Vec::with_capacity(children.len() + 1);
            args.push(Expr::id(function_name(name)).with_metas(MetaContainer::located(name.span)));
            for child in children {
                args.push(to_expr(child)?);
            }
            ExprKind::NAry {
                op: NAryOp::Call,
                args,
            }
        }
        ParseKind::CallAgg | ParseKind::CallDistinctAgg => {
            let name = token.as_ref().ok_or_else(|| malformed("aggregate without a name"))?;
            let [arg] = take(children, "aggregate")?;
            ExprKind::CallAgg {
                func: SymbolicName::located(function_name(name), name.span),
                quantifier: if kind == ParseKind::CallDistinctAgg {
                    SetQuantifier::Distinct
                } else {
                    SetQuantifier::All
                },
                arg: Box::new(to_expr(arg)?),
            }
        }
        ParseKind::CallAggWildcard => {
            let name = token.as_ref().ok_or_else(|| malformed("aggregate without a name"))?;
            let one = Expr::lit(1_i64).with_metas(MetaContainer::located(name.span));
            let expr = Expr::new(ExprKind::CallAgg {
                func: SymbolicName::located(function_name(name), name.span),
                quantifier: SetQuantifier::All,
                arg: Box::new(one),
            });
            return Ok(expr.with_metas(metas.with(Meta::IsCountStar)));
        }
        ParseKind::Path => {
            let mut children = children.into_iter();
            let root = children.next().ok_or_else(|| malformed("path without a root"))?;
            let steps = children.map(path_step).collect::<Result<Vec<_>>>()?;
            if steps.is_empty() {
                return Err(malformed("path without steps"));
            }
            ExprKind::Path {
                root: Box::new(to_expr(root)?),
                steps,
            }
        }
        ParseKind::List | ParseKind::Bag | ParseKind::Sexp => ExprKind::Seq {
            kind: match kind {
                ParseKind::Bag => SeqKind::Bag,
                ParseKind::Sexp => SeqKind::Sexp,
                _ => SeqKind::List,
            },
            items: convert_all(children)?,
        },
        ParseKind::Struct => {
            let mut fields = Vec::with_capacity(children.len());
            for member in children {
                if member.kind != ParseKind::Member {
                    return Err(unexpected_shape(member.kind, "struct"));
                }
                let [name, value] = take(member.children, "struct member")?;
                fields.push(StructField {
                    name: to_expr(name)?,
                    value: to_expr(value)?,
                });
            }
            ExprKind::Struct(fields)
        }
        ParseKind::SimpleCase => {
            let mut children = children.into_iter();
            let value = children
                .next()
                .ok_or_else(|| malformed("CASE without an operand"))?;
            let (whens, default) = case_arms(children)?;
            ExprKind::SimpleCase {
                value: Box::new(to_expr(value)?),
                whens,
                default,
            }
        }
        ParseKind::SearchedCase => {
            let (whens, default) = case_arms(children.into_iter())?;
            ExprKind::SearchedCase { whens, default }
        }
        ParseKind::Select => ExprKind::Select(Box::new(select(children)?)),
        ParseKind::Dml => ExprKind::Dml(Box::new(dml(children)?)),
        ParseKind::CreateTable => ExprKind::CreateTable {
            name: symbolic_name(token.as_ref())?,
        },
        ParseKind::DropTable => ExprKind::DropTable {
            name: symbolic_name(token.as_ref())?,
        },
        ParseKind::CreateIndex => ExprKind::CreateIndex {
            table: symbolic_name(token.as_ref())?,
            keys: convert_all(children)?,
        },
        ParseKind::DropIndex => {
            let [index] = take(children, "DROP INDEX")?;
            ExprKind::DropIndex {
                table: symbolic_name(token.as_ref())?,
                index: Box::new(to_expr(index)?),
            }
        }
        ParseKind::Type
        | ParseKind::PathField
        | ParseKind::PathIndex
        | ParseKind::PathWildcard
        | ParseKind::PathUnpivot
        | ParseKind::Member
        | ParseKind::When
        | ParseKind::Else
        | ParseKind::SelectList
        | ParseKind::SelectValue
        | ParseKind::PivotProjection
        | ParseKind::Distinct
        | ParseKind::ProjectAll
        | ParseKind::Star
        | ParseKind::AsAlias
        | ParseKind::AtAlias
        | ParseKind::ByAlias
        | ParseKind::From
        | ParseKind::Unpivot
        | ParseKind::InnerJoin
        | ParseKind::LeftJoin
        | ParseKind::RightJoin
        | ParseKind::OuterJoin
        | ParseKind::Where
        | ParseKind::Group
        | ParseKind::GroupPartial
        | ParseKind::GroupName
        | ParseKind::Having
        | ParseKind::Limit
        | ParseKind::Insert
        | ParseKind::InsertValue
        | ParseKind::Set
        | ParseKind::Assignment
        | ParseKind::Remove
        | ParseKind::Delete => return Err(unexpected_shape(kind, "expression")),
    };
    Ok(Expr::new(expr_kind).with_metas(metas))
}

fn atom(token: Option<Token>) -> Result<ExprKind> {
    let token = token.ok_or_else(|| malformed("atom without a token"))?;
    Ok(match token.kind {
        TokenKind::Literal | TokenKind::IonLiteral => ExprKind::Literal(
            token
                .value
                .ok_or_else(|| malformed("literal without a value"))?,
        ),
        TokenKind::Null => ExprKind::Literal(Value::Null),
        TokenKind::Missing => ExprKind::Missing,
        TokenKind::Identifier | TokenKind::QuotedIdentifier => ExprKind::Id {
            name: name_text(&token)?,
            case: case_of(&token),
            scope: ScopeQualifier::Unqualified,
        },
        other => return Err(malformed(format!("atom token {other:?}"))),
    })
}

/// Converts binary and ternary operator nodes, desugaring the merged
/// negated operators into `NOT`.
fn operator(token: Option<Token>, children: Vec<ParseNode>, metas: MetaContainer) -> Result<Expr> {
    let kind = token
        .map(|t| t.kind)
        .ok_or_else(|| malformed("operator without a token"))?;
    let op = token_to_nary_op(&kind).ok_or_else(|| malformed(format!("operator {kind:?}")))?;
    let args = convert_all(children)?;
    if !op.accepts(args.len()) {
        return Err(malformed(format!(
            "'{}' with {} operands",
            op.symbol(),
            args.len()
        )));
    }
    let expr = Expr::nary(op, args).with_metas(metas.clone());
    Ok(if is_negated(&kind) {
        negate(expr, metas)
    } else {
        expr
    })
}

/// Wraps `expr` in a `NOT` marked as coming from a negated operator.
fn negate(expr: Expr, metas: MetaContainer) -> Expr {
    Expr::nary(NAryOp::Not, vec![expr]).with_metas(metas.with(Meta::LegacyLogicalNot))
}

fn data_type(node: ParseNode) -> Result<DataType> {
    if node.kind != ParseKind::Type {
        return Err(unexpected_shape(node.kind, "type"));
    }
    let name = node
        .token
        .as_ref()
        .and_then(Token::text)
        .ok_or_else(|| malformed("type without a name"))?;
    let sql_type =
        SqlDataType::from_name(name).ok_or_else(|| malformed(format!("type name '{name}'")))?;
    let args = node
        .children
        .iter()
        .map(|arg| {
            arg.token
                .as_ref()
                .and_then(|t| t.value.as_ref())
                .and_then(Value::as_i64)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| malformed("type argument"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DataType::with_args(sql_type, args))
}

fn path_step(node: ParseNode) -> Result<PathStep> {
    let metas = located(&node);
    let kind = match node.kind {
        ParseKind::PathField => {
            let token = node
                .token
                .as_ref()
                .ok_or_else(|| malformed("path field without a token"))?;
            let index = Expr::lit(Value::string(name_text(token)?))
                .with_metas(MetaContainer::located(token.span));
            PathStepKind::Expr {
                index: Box::new(index),
                case: case_of(token),
            }
        }
        ParseKind::PathIndex => {
            let [index] = take(node.children, "path index")?;
            PathStepKind::Expr {
                index: Box::new(to_expr(index)?),
                case: CaseSensitivity::Sensitive,
            }
        }
        ParseKind::PathWildcard => PathStepKind::Wildcard,
        ParseKind::PathUnpivot => PathStepKind::Unpivot,
        other => return Err(unexpected_shape(other, "path step")),
    };
    Ok(PathStep::new(kind).with_metas(metas))
}

type CaseArms = (Vec<WhenClause>, Option<Box<Expr>>);

fn case_arms(children: impl Iterator<Item = ParseNode>) -> Result<CaseArms> {
    let mut whens = Vec::new();
    let mut default = None;
    for child in children {
        match child.kind {
            ParseKind::When if default.is_none() => {
                let [condition, result] = take(child.children, "WHEN")?;
                whens.push(WhenClause {
                    condition: to_expr(condition)?,
                    result: to_expr(result)?,
                });
            }
            ParseKind::Else if default.is_none() => {
                let [value] = take(child.children, "ELSE")?;
                default = Some(Box::new(to_expr(value)?));
            }
            other => return Err(unexpected_shape(other, "CASE")),
        }
    }
    if whens.is_empty() {
        return Err(malformed("CASE without WHEN"));
    }
    Ok((whens, default))
}

/// Consumes the clause list of a `SELECT`/`PIVOT` node.
///
/// Clauses must appear once each, in grammar order; anything left over is
/// a malformed tree.
fn select(children: Vec<ParseNode>) -> Result<Select> {
    let mut clauses = children.into_iter().peekable();
    let projection_node = clauses
        .next()
        .ok_or_else(|| malformed("query without a projection"))?;
    let (quantifier, projection) = projection(projection_node)?;

    let from = match clauses.next() {
        Some(node) if node.kind == ParseKind::From => from_clause(node)?,
        Some(node) => return Err(unexpected_shape(node.kind, "FROM position")),
        None => return Err(malformed("query without FROM")),
    };

    let mut select = Select::new(projection, from);
    select.quantifier = quantifier;

    if let Some(node) = clauses.next_if(|n| n.kind == ParseKind::Where) {
        select.where_clause = Some(single_child(node, "WHERE")?);
    }
    if let Some(node) =
        clauses.next_if(|n| matches!(n.kind, ParseKind::Group | ParseKind::GroupPartial))
    {
        select.group_by = Some(group_by(node)?);
    }
    if let Some(node) = clauses.next_if(|n| n.kind == ParseKind::Having) {
        select.having = Some(single_child(node, "HAVING")?);
    }
    if let Some(node) = clauses.next_if(|n| n.kind == ParseKind::Limit) {
        select.limit = Some(single_child(node, "LIMIT")?);
    }
    if let Some(node) = clauses.next() {
        return Err(unexpected_shape(node.kind, "query clause list"));
    }
    Ok(select)
}

fn projection(node: ParseNode) -> Result<(SetQuantifier, Projection)> {
    match node.kind {
        ParseKind::Distinct => {
            let [inner] = take(node.children, "DISTINCT")?;
            let (_, projection) = projection(inner)?;
            Ok((SetQuantifier::Distinct, projection))
        }
        ParseKind::SelectList => {
            let items = node
                .children
                .into_iter()
                .map(select_item)
                .collect::<Result<Vec<_>>>()?;
            Ok((SetQuantifier::All, Projection::List(items)))
        }
        ParseKind::SelectValue => Ok((
            SetQuantifier::All,
            Projection::Value(single_child(node, "SELECT VALUE")?),
        )),
        ParseKind::PivotProjection => {
            let [value, key] = take(node.children, "PIVOT")?;
            Ok((
                SetQuantifier::All,
                Projection::Pivot {
                    value: to_expr(value)?,
                    key: to_expr(key)?,
                },
            ))
        }
        other => Err(unexpected_shape(other, "projection")),
    }
}

fn select_item(node: ParseNode) -> Result<SelectListItem> {
    Ok(match node.kind {
        ParseKind::Star => SelectListItem::Star,
        ParseKind::ProjectAll => SelectListItem::ProjectAll(single_child(node, "project all")?),
        ParseKind::AsAlias => {
            let alias = symbolic_name(node.token.as_ref())?;
            SelectListItem::Expr {
                expr: single_child(node, "AS")?,
                alias: Some(alias),
            }
        }
        _ => SelectListItem::Expr {
            expr: to_expr(node)?,
            alias: None,
        },
    })
}

fn group_by(node: ParseNode) -> Result<GroupBy> {
    let strategy = if node.kind == ParseKind::GroupPartial {
        GroupingStrategy::Partial
    } else {
        GroupingStrategy::Full
    };
    let mut items = Vec::new();
    let mut group_name = None;
    for child in node.children {
        match child.kind {
            ParseKind::GroupName if group_name.is_none() => {
                group_name = Some(symbolic_name(child.token.as_ref())?);
            }
            ParseKind::AsAlias if group_name.is_none() => {
                let alias = symbolic_name(child.token.as_ref())?;
                items.push(GroupByItem {
                    expr: single_child(child, "AS")?,
                    alias: Some(alias),
                });
            }
            ParseKind::GroupName => return Err(unexpected_shape(child.kind, "GROUP BY")),
            _ if group_name.is_none() => items.push(GroupByItem {
                expr: to_expr(child)?,
                alias: None,
            }),
            other => return Err(unexpected_shape(other, "GROUP BY after GROUP AS")),
        }
    }
    if items.is_empty() {
        return Err(malformed("GROUP BY without keys"));
    }
    Ok(GroupBy {
        strategy,
        items,
        group_name,
    })
}

fn from_clause(node: ParseNode) -> Result<FromSource> {
    let [source] = take(node.children, "FROM")?;
    from_source(source)
}

fn from_source(node: ParseNode) -> Result<FromSource> {
    let metas = located(&node);
    let op = match node.kind {
        ParseKind::InnerJoin => Some(JoinOp::Inner),
        ParseKind::LeftJoin => Some(JoinOp::Left),
        ParseKind::RightJoin => Some(JoinOp::Right),
        ParseKind::OuterJoin => Some(JoinOp::Outer),
        _ => None,
    };

    if let Some(op) = op {
        let span = node.token.as_ref().map(|t| t.span);
        let mut children = node.children.into_iter();
        let (Some(left), Some(right)) = (children.next(), children.next()) else {
            return Err(malformed("join without two sources"));
        };
        let condition = children.next();
        if children.next().is_some() {
            return Err(malformed("join with extra children"));
        }
        let implicit = condition.is_none();
        let condition = match condition {
            Some(cond) => to_expr(cond)?,
            None => Expr::lit(true).with_metas(span.map(MetaContainer::located).unwrap_or_default()),
        };
        let join = FromSource::new(FromSourceKind::Join {
            op,
            left: Box::new(from_source(left)?),
            right: Box::new(from_source(right)?),
            condition,
        })
        .with_metas(metas);
        return Ok(if implicit {
            join.with_meta(Meta::IsImplicitJoin)
        } else {
            join
        });
    }

    let mut alias = None;
    let mut at = None;
    let mut by = None;
    let mut current = node;
    loop {
        let slot = match current.kind {
            ParseKind::AsAlias => &mut alias,
            ParseKind::AtAlias => &mut at,
            ParseKind::ByAlias => &mut by,
            _ => break,
        };
        if slot.is_some() {
            return Err(unexpected_shape(current.kind, "aliased source"));
        }
        *slot = Some(symbolic_name(current.token.as_ref())?);
        let [inner] = take(current.children, "alias")?;
        current = inner;
    }

    let kind = if current.kind == ParseKind::Unpivot {
        FromSourceKind::Unpivot {
            expr: single_child(current, "UNPIVOT")?,
            alias,
            at,
            by,
        }
    } else {
        FromSourceKind::Expr {
            expr: to_expr(current)?,
            alias,
            at,
            by,
        }
    };
    Ok(FromSource::new(kind).with_metas(metas))
}

fn dml(children: Vec<ParseNode>) -> Result<DataManipulation> {
    let mut children = children.into_iter().peekable();
    let op_node = children
        .next()
        .ok_or_else(|| malformed("DML without an operation"))?;
    let op = dml_op(op_node)?;
    let from = match children.next_if(|n| n.kind == ParseKind::From) {
        Some(node) => Some(from_clause(node)?),
        None => None,
    };
    let where_clause = match children.next_if(|n| n.kind == ParseKind::Where) {
        Some(node) => Some(single_child(node, "WHERE")?),
        None => None,
    };
    if let Some(node) = children.next() {
        return Err(unexpected_shape(node.kind, "DML clause list"));
    }
    Ok(DataManipulation {
        op,
        from,
        where_clause,
    })
}

fn dml_op(node: ParseNode) -> Result<DmlOp> {
    Ok(match node.kind {
        ParseKind::Insert => {
            let [target, values] = take(node.children, "INSERT")?;
            DmlOp::Insert {
                target: to_expr(target)?,
                values: to_expr(values)?,
            }
        }
        ParseKind::InsertValue => {
            let mut children = node.children.into_iter();
            let (Some(target), Some(value)) = (children.next(), children.next()) else {
                return Err(malformed("INSERT VALUE without target and value"));
            };
            let position = children.next().map(to_expr).transpose()?;
            DmlOp::InsertValue {
                target: to_expr(target)?,
                value: to_expr(value)?,
                position,
            }
        }
        ParseKind::Set => {
            let mut assignments = Vec::with_capacity(node.children.len());
            for child in node.children {
                if child.kind != ParseKind::Assignment {
                    return Err(unexpected_shape(child.kind, "SET"));
                }
                let [target, value] = take(child.children, "assignment")?;
                assignments.push(Assignment {
                    target: to_expr(target)?,
                    value: to_expr(value)?,
                });
            }
            DmlOp::Set(assignments)
        }
        ParseKind::Remove => DmlOp::Remove(single_child(node, "REMOVE")?),
        ParseKind::Delete => DmlOp::Delete,
        other => return Err(unexpected_shape(other, "DML operation")),
    })
}

// --- Helpers ---

fn located(node: &ParseNode) -> MetaContainer {
    node.span().map(MetaContainer::located).unwrap_or_default()
}

fn convert_all(children: Vec<ParseNode>) -> Result<Vec<Expr>> {
    children.into_iter().map(to_expr).collect()
}

fn single_child(node: ParseNode, what: &str) -> Result<Expr> {
    let [child] = take(node.children, what)?;
    to_expr(child)
}

fn take<const N: usize>(children: Vec<ParseNode>, what: &str) -> Result<[ParseNode; N]> {
    children.try_into().map_err(|rest: Vec<ParseNode>| {
        malformed(format!("{what} expects {N} children, found {}", rest.len()))
    })
}

fn name_text(token: &Token) -> Result<String> {
    token
        .text()
        .map(str::to_string)
        .ok_or_else(|| malformed("name token without text"))
}

/// Lowercased function name. Keyword-named functions such as `TRIM` use
/// the keyword spelling.
fn function_name(token: &Token) -> String {
    token
        .key()
        .or_else(|| token.text().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

fn symbolic_name(token: Option<&Token>) -> Result<SymbolicName> {
    let token = token.ok_or_else(|| malformed("name without a token"))?;
    Ok(SymbolicName::located(name_text(token)?, token.span))
}

const fn case_of(token: &Token) -> CaseSensitivity {
    match token.kind {
        TokenKind::QuotedIdentifier => CaseSensitivity::Sensitive,
        _ => CaseSensitivity::Insensitive,
    }
}

fn malformed(message: impl Into<String>) -> Error {
    InternalError::new(message).into()
}

fn unexpected_shape(kind: ParseKind, position: &str) -> Error {
    malformed(format!("unexpected {kind:?} node in {position}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IS_COUNT_STAR_TAG, LEGACY_LOGICAL_NOT_TAG};
    use crate::lexer::Span;
    use crate::parser::Parser;

    fn convert(sql: &str) -> Expr {
        Parser::new(sql).parse_statement().unwrap()
    }

    #[test]
    fn test_not_in_desugars() {
        let expr = convert("a NOT IN (1, 2)");
        assert!(expr.metas.contains(LEGACY_LOGICAL_NOT_TAG));
        let (op, args) = expr.as_nary().unwrap();
        assert_eq!(op, NAryOp::Not);
        assert_eq!(args[0].as_nary().map(|(op, _)| op), Some(NAryOp::In));
        assert!(!args[0].metas.contains(LEGACY_LOGICAL_NOT_TAG));
    }

    #[test]
    fn test_count_star() {
        let expr = convert("COUNT(*)");
        assert!(expr.metas.contains(IS_COUNT_STAR_TAG));
        match &expr.kind {
            ExprKind::CallAgg { func, arg, .. } => {
                assert_eq!(func.name(), "count");
                assert_eq!(**arg, Expr::lit(1_i64));
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_source_locations() {
        let expr = convert("a +\n  b");
        let loc = expr.location().unwrap();
        assert_eq!((loc.line, loc.column), (1, 3));
        let (_, args) = expr.as_nary().unwrap();
        let loc = args[1].location().unwrap();
        assert_eq!((loc.line, loc.column), (2, 3));
    }

    #[test]
    fn test_non_expression_shape_is_internal() {
        let node = ParseNode::new(ParseKind::Where, None, Vec::new());
        let err = to_expr(node).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_leftover_clause_is_internal() {
        let tree = Parser::new("SELECT a FROM t").parse_tree().unwrap();
        let mut children = tree.children;
        let limit = ParseNode::new(
            ParseKind::Limit,
            None,
            vec![ParseNode::symbol_atom("x", Span::default())],
        );
        let where_node = ParseNode::new(
            ParseKind::Where,
            None,
            vec![ParseNode::symbol_atom("y", Span::default())],
        );
        children.push(limit);
        children.push(where_node);
        let err = to_expr(ParseNode::new(ParseKind::Select, tree.token, children)).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_implicit_join_meta() {
        let expr = convert("SELECT * FROM a, b");
        let ExprKind::Select(select) = &expr.kind else {
            panic!("expected select");
        };
        assert!(select.from.metas.contains(crate::ast::IS_IMPLICIT_JOIN_TAG));
        match &select.from.kind {
            FromSourceKind::Join { condition, .. } => assert_eq!(*condition, Expr::lit(true)),
            other => panic!("expected join, got {other:?}"),
        }
    }
}
