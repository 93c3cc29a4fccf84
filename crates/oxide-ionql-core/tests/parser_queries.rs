//! Tests for SELECT and PIVOT queries.

mod common;
use common::*;

use oxide_ionql_core::ast::{
    ExprKind, FromSourceKind, GroupingStrategy, JoinOp, NAryOp, Projection, SelectListItem,
    SetQuantifier, IS_IMPLICIT_JOIN_TAG,
};
use oxide_ionql_core::{Expr, Value};

// ===================================================================
// Projections
// ===================================================================

#[test]
fn select_star() {
    let select = parse_select("SELECT * FROM t");
    assert_eq!(select.projection, Projection::List(vec![SelectListItem::Star]));
    assert_eq!(select.quantifier, SetQuantifier::All);
    assert_eq!(*source_expr(&select), Expr::id("t"));
}

#[test]
fn select_list_with_aliases() {
    let select = parse_select("SELECT a, b AS x, c y FROM t");
    let Projection::List(items) = select.projection else {
        panic!("Expected select list");
    };
    assert_eq!(items.len(), 3);
    let aliases: Vec<Option<&str>> = items
        .iter()
        .map(|item| match item {
            SelectListItem::Expr { alias, .. } => alias.as_ref().map(|a| a.name()),
            _ => None,
        })
        .collect();
    assert_eq!(aliases, vec![None, Some("x"), Some("y")]);
}

#[test]
fn select_project_all() {
    let select = parse_select("SELECT t.a.*, b FROM t");
    let Projection::List(items) = select.projection else {
        panic!("Expected select list");
    };
    match &items[0] {
        SelectListItem::ProjectAll(expr) => {
            assert!(matches!(&expr.kind, ExprKind::Path { steps, .. } if steps.len() == 1));
        }
        other => panic!("Expected project-all, got {other:?}"),
    }
    match parse_select("SELECT t.* FROM t").projection {
        Projection::List(items) => {
            assert_eq!(items, vec![SelectListItem::ProjectAll(Expr::id("t"))]);
        }
        other => panic!("Expected select list, got {other:?}"),
    }
}

#[test]
fn select_distinct() {
    let select = parse_select("SELECT DISTINCT a FROM t");
    assert_eq!(select.quantifier, SetQuantifier::Distinct);
    let select = parse_select("SELECT ALL a FROM t");
    assert_eq!(select.quantifier, SetQuantifier::All);
}

#[test]
fn select_value() {
    let select = parse_select("SELECT VALUE {'a': x} FROM t");
    assert!(matches!(select.projection, Projection::Value(Expr { kind: ExprKind::Struct(_), .. })));
}

#[test]
fn pivot() {
    let select = parse_select("PIVOT v AT k FROM t");
    assert!(select.is_pivot());
    assert_eq!(
        select.projection,
        Projection::Pivot {
            value: Expr::id("v"),
            key: Expr::id("k"),
        }
    );
}

// ===================================================================
// FROM sources
// ===================================================================

#[test]
fn from_aliases() {
    let select = parse_select("SELECT x FROM t AS x AT i BY b");
    match select.from.kind {
        FromSourceKind::Expr {
            expr,
            alias,
            at,
            by,
        } => {
            assert_eq!(expr, Expr::id("t"));
            assert_eq!(alias.unwrap().name(), "x");
            assert_eq!(at.unwrap().name(), "i");
            assert_eq!(by.unwrap().name(), "b");
        }
        other => panic!("Expected source, got {other:?}"),
    }
}

#[test]
fn from_unpivot() {
    let select = parse_select("SELECT v FROM UNPIVOT t AS v AT n");
    match select.from.kind {
        FromSourceKind::Unpivot { expr, alias, at, .. } => {
            assert_eq!(expr, Expr::id("t"));
            assert_eq!(alias.unwrap().name(), "v");
            assert_eq!(at.unwrap().name(), "n");
        }
        other => panic!("Expected unpivot, got {other:?}"),
    }
}

#[test]
fn from_subquery() {
    let select = parse_select("SELECT x FROM (SELECT a FROM t) AS s");
    assert!(matches!(source_expr(&select).kind, ExprKind::Select(_)));
}

#[test]
fn from_comma_is_implicit_inner_join() {
    let select = parse_select("SELECT * FROM a, b");
    assert!(select.from.metas.contains(IS_IMPLICIT_JOIN_TAG));
    match select.from.kind {
        FromSourceKind::Join { op, condition, .. } => {
            assert_eq!(op, JoinOp::Inner);
            assert_eq!(condition, Expr::lit(true));
        }
        other => panic!("Expected join, got {other:?}"),
    }
}

#[test]
fn from_joins_nest_left() {
    let select = parse_select("SELECT * FROM a LEFT JOIN b ON a.k = b.k, c");
    match select.from.kind {
        FromSourceKind::Join { op, left, right, .. } => {
            assert_eq!(op, JoinOp::Inner);
            assert!(matches!(&right.kind, FromSourceKind::Expr { expr, .. } if *expr == Expr::id("c")));
            match &left.kind {
                FromSourceKind::Join { op, condition, .. } => {
                    assert_eq!(*op, JoinOp::Left);
                    assert_eq!(condition.as_nary().unwrap().0, NAryOp::Eq);
                    assert!(!left.metas.contains(IS_IMPLICIT_JOIN_TAG));
                }
                other => panic!("Expected inner join, got {other:?}"),
            }
        }
        other => panic!("Expected join, got {other:?}"),
    }
}

#[test]
fn from_join_kinds() {
    for (sql, expected) in [
        ("SELECT * FROM a RIGHT OUTER JOIN b ON true", JoinOp::Right),
        ("SELECT * FROM a FULL JOIN b ON true", JoinOp::Outer),
        ("SELECT * FROM a INNER JOIN b ON true", JoinOp::Inner),
        ("SELECT * FROM a LEFT CROSS JOIN b", JoinOp::Left),
        ("SELECT * FROM a CROSS JOIN b", JoinOp::Inner),
    ] {
        match parse_select(sql).from.kind {
            FromSourceKind::Join { op, .. } => assert_eq!(op, expected, "{sql}"),
            other => panic!("Expected join for {sql}, got {other:?}"),
        }
    }
}

#[test]
fn from_parenthesized_join_group() {
    let select = parse_select("SELECT * FROM a JOIN (b JOIN c ON true) ON true");
    match select.from.kind {
        FromSourceKind::Join { right, .. } => {
            assert!(matches!(right.kind, FromSourceKind::Join { .. }));
        }
        other => panic!("Expected join, got {other:?}"),
    }
}

// ===================================================================
// Clauses
// ===================================================================

#[test]
fn clause_where_group_having_limit() {
    let select = parse_select(
        "SELECT k, COUNT(*) FROM t WHERE x > 1 GROUP BY k HAVING COUNT(*) > 2 LIMIT 10",
    );
    assert_eq!(select.where_clause.unwrap().as_nary().unwrap().0, NAryOp::Gt);
    let group_by = select.group_by.unwrap();
    assert_eq!(group_by.strategy, GroupingStrategy::Full);
    assert_eq!(group_by.items[0].expr, Expr::id("k"));
    assert!(group_by.group_name.is_none());
    assert!(select.having.is_some());
    assert_eq!(select.limit, Some(Expr::lit(10)));
}

#[test]
fn clause_group_partial_with_names() {
    let select = parse_select("SELECT g FROM t GROUP PARTIAL BY a AS ka, b GROUP AS g");
    let group_by = select.group_by.unwrap();
    assert_eq!(group_by.strategy, GroupingStrategy::Partial);
    assert_eq!(group_by.items.len(), 2);
    assert_eq!(group_by.items[0].alias.as_ref().unwrap().name(), "ka");
    assert!(group_by.items[1].alias.is_none());
    assert_eq!(group_by.group_name.unwrap().name(), "g");
}

#[test]
fn clause_limit_parameter() {
    let select = parse_select("SELECT a FROM t WHERE a = ? LIMIT ?");
    assert_eq!(select.limit.unwrap().kind, ExprKind::Parameter(2));
}

// ===================================================================
// Nesting
// ===================================================================

#[test]
fn nested_subquery_in_where() {
    let select = parse_select("SELECT a FROM t WHERE a IN (SELECT VALUE b FROM u)");
    let cond = select.where_clause.unwrap();
    let (op, args) = cond.as_nary().unwrap();
    assert_eq!(op, NAryOp::In);
    assert!(matches!(args[1].kind, ExprKind::Select(_)));
}

#[test]
fn union_of_queries() {
    let expr = parse("SELECT a FROM t UNION SELECT a FROM u");
    let (op, args) = expr.as_nary().unwrap();
    assert_eq!(op, NAryOp::Union);
    assert!(args.iter().all(|a| matches!(a.kind, ExprKind::Select(_))));
}

#[test]
fn trailing_semicolon_accepted() {
    let select = parse_select("SELECT a FROM t;");
    assert_eq!(select.limit, None);
    assert_eq!(
        parse_select("SELECT 'x' FROM t").projection,
        Projection::List(vec![SelectListItem::Expr {
            expr: Expr::lit(Value::string("x")),
            alias: None,
        }])
    );
}
