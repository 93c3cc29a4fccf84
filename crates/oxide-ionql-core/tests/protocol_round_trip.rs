//! Tests that parsed statements survive the wire format unchanged.

mod common;
use common::*;

use oxide_ionql_core::ast::{
    ExprKind, FromSourceKind, Meta, NAryOp, SourceLocation, IS_COUNT_STAR_TAG,
    IS_IMPLICIT_JOIN_TAG, LEGACY_LOGICAL_NOT_TAG,
};
use oxide_ionql_core::{
    deserialize, deserialize_str, serialize, serialize_to_string, serialize_with_version,
    AstVersion, Expr,
};

// ===================================================================
// Expressions
// ===================================================================

#[test]
fn round_trip_literals() {
    round_trip("1");
    round_trip("-12.50");
    round_trip("1e3");
    round_trip("'it''s'");
    round_trip("true");
    round_trip("NULL");
    round_trip("MISSING");
    round_trip("`{a: [1, 2.5, \"x\"], b: (c d)}`");
    round_trip("123456789012345678901234567890");
    round_trip("1e30");
    round_trip("1e-40");
    round_trip("123456789012345678901234567890.1234567890");
}

#[test]
fn round_trip_keeps_decimal_digits() {
    for (sql, wire) in [
        ("1e30", "(lit 1d30)"),
        ("1e-40", "(lit 1d-40)"),
        ("-12.50", "(lit -12.50)"),
        (
            "123456789012345678901234567890.1234567890",
            "(lit 123456789012345678901234567890.1234567890)",
        ),
    ] {
        let text = serialize_to_string(&parse(sql));
        assert!(text.contains(wire), "{sql} wrote {text}");
        let back = deserialize_str(&text).unwrap();
        assert_eq!(serialize_to_string(&back), text);
    }
}

#[test]
fn round_trip_identifiers() {
    round_trip("a");
    round_trip("\"MixedCase\"");
    round_trip("@local");
    round_trip("@local.field");
    round_trip("?");
}

#[test]
fn round_trip_operators() {
    round_trip("1 + 2 * 3 - 4 / 5 % 6");
    round_trip("a = b AND c <> d OR NOT e");
    round_trip("a < b AND a <= b AND a > b AND a >= b");
    round_trip("a || 'x'");
    round_trip("-a");
    round_trip("x BETWEEN 1 AND 10");
    round_trip("s LIKE 'a%' ESCAPE '\\'");
    round_trip("x IN [1, 2, 3]");
}

#[test]
fn round_trip_negated_operators() {
    round_trip("a NOT IN (1, 2)");
    round_trip("a NOT LIKE 'x%'");
    round_trip("a NOT BETWEEN 1 AND 2");
    round_trip("a IS NOT NULL");
    round_trip("NOT (a IN b)");
}

#[test]
fn round_trip_functions() {
    round_trip("upper(a)");
    round_trip("now()");
    round_trip("CAST(a AS DECIMAL(5, 2))");
    round_trip("a IS MISSING");
    round_trip("SUBSTRING(s FROM 1 FOR 2)");
    round_trip("TRIM(TRAILING FROM s)");
    round_trip("EXTRACT(MONTH FROM d)");
    round_trip("COUNT(*)");
    round_trip("SUM(DISTINCT a)");
    round_trip("avg(a)");
}

#[test]
fn round_trip_constructors_and_paths() {
    round_trip("{'a': 1, 'b': [2, <<3>>]}");
    round_trip("sexp(1, 2)");
    round_trip("a.b[0].\"C\"[*].d");
    round_trip("a[1 + 1].*");
    round_trip("CASE a WHEN 1 THEN 'x' WHEN 2 THEN 'y' ELSE 'z' END");
    round_trip("CASE WHEN a THEN 1 END");
}

// ===================================================================
// Queries and statements
// ===================================================================

#[test]
fn round_trip_queries() {
    round_trip("SELECT * FROM t");
    round_trip("SELECT DISTINCT a, b AS c, t.x.* FROM t");
    round_trip("SELECT VALUE {'k': v} FROM t AS x AT i BY b");
    round_trip("PIVOT v AT k FROM t");
    round_trip("SELECT v FROM UNPIVOT t AS v AT n");
    round_trip("SELECT a FROM t WHERE a > 1 GROUP BY a HAVING COUNT(*) > 1 LIMIT 5");
    round_trip("SELECT g FROM t GROUP PARTIAL BY a AS ka, b GROUP AS g");
    round_trip("SELECT a FROM t UNION ALL SELECT a FROM u");
    round_trip("SELECT x FROM (SELECT a FROM t) AS s WHERE x IN (SELECT VALUE b FROM u)");
}

#[test]
fn round_trip_joins() {
    round_trip("SELECT * FROM a, b, c");
    round_trip("SELECT * FROM a JOIN b");
    round_trip("SELECT * FROM a LEFT JOIN b ON a.k = b.k");
    round_trip("SELECT * FROM a RIGHT JOIN b ON true FULL JOIN c ON false");
    round_trip("SELECT * FROM a CROSS JOIN b");
    round_trip("SELECT * FROM a JOIN (b JOIN c ON true) ON true");
}

#[test]
fn round_trip_statements() {
    round_trip("INSERT INTO t <<{'a': 1}>>");
    round_trip("INSERT INTO t VALUE 1 AT 0");
    round_trip("INSERT INTO t VALUE 1");
    round_trip("SET a = 1, b.c = 2");
    round_trip("REMOVE t.a");
    round_trip("UPDATE t SET a = 1 WHERE b = 2");
    round_trip("FROM t AS x WHERE x.a = 1 SET x.b = 2");
    round_trip("DELETE FROM t WHERE a = 1");
    round_trip("CREATE TABLE t");
    round_trip("DROP TABLE t");
    round_trip("CREATE INDEX ON t (a, b.c)");
    round_trip("DROP INDEX i ON t");
}

// ===================================================================
// Metadata
// ===================================================================

#[test]
fn source_locations_survive_v1() {
    let expr = parse("a +\n  b");
    let back = deserialize(&serialize(&expr)).unwrap();
    assert_eq!(
        back.location(),
        Some(SourceLocation {
            line: 1,
            column: 3,
            length: 1
        })
    );
    let (_, args) = back.as_nary().unwrap();
    assert_eq!(args[1].location(), expr.as_nary().unwrap().1[1].location());
}

#[test]
fn source_locations_lose_length_in_v0() {
    let expr = parse("abc");
    let back = deserialize(&serialize_with_version(&expr, AstVersion::V0)).unwrap();
    let loc = back.location().unwrap();
    assert_eq!((loc.line, loc.column, loc.length), (1, 1, 0));
}

#[test]
fn flag_metas_survive_both_versions() {
    for version in [AstVersion::V0, AstVersion::V1] {
        let back = deserialize(&serialize_with_version(&parse("a NOT IN b"), version)).unwrap();
        assert!(back.metas.contains(LEGACY_LOGICAL_NOT_TAG), "{version}");
        let (_, args) = back.as_nary().unwrap();
        assert!(!args[0].metas.contains(LEGACY_LOGICAL_NOT_TAG), "{version}");

        let back = deserialize(&serialize_with_version(&parse("COUNT(*)"), version)).unwrap();
        assert!(back.metas.contains(IS_COUNT_STAR_TAG), "{version}");

        let back =
            deserialize(&serialize_with_version(&parse("SELECT * FROM a, b"), version)).unwrap();
        match back.kind {
            ExprKind::Select(select) => {
                assert!(select.from.metas.contains(IS_IMPLICIT_JOIN_TAG), "{version}");
                assert!(matches!(select.from.kind, FromSourceKind::Join { .. }));
            }
            other => panic!("Expected select, got {other:?}"),
        }
    }
}

#[test]
fn unaliased_source_keeps_both_locations() {
    for version in [AstVersion::V0, AstVersion::V1] {
        let wire = serialize_with_version(&parse("SELECT * FROM t"), version);
        let text = wire.to_string();
        assert!(!text.contains("(term (exp (term"), "{version}: {text}");
        assert!(!text.contains("(meta (meta"), "{version}: {text}");

        let ExprKind::Select(select) = deserialize(&wire).unwrap().kind else {
            panic!("Expected select in {version}");
        };
        let loc = select.from.metas.source_location().unwrap();
        assert_eq!((loc.line, loc.column), (1, 15), "{version}");
        assert_eq!(source_expr(&select).location().map(|l| l.column), Some(15));
    }
}

#[test]
fn synthetic_name_meta_is_not_written() {
    let expr = Expr::id("x").with_meta(Meta::IsSyntheticName);
    let back = deserialize(&serialize(&expr)).unwrap();
    assert!(back.metas.is_empty());
}

// ===================================================================
// Wire shapes
// ===================================================================

#[test]
fn wire_negated_operator_is_restored() {
    let expr = Expr::nary(
        NAryOp::Not,
        vec![Expr::nary(NAryOp::In, vec![Expr::id("a"), Expr::id("b")])],
    )
    .with_meta(Meta::LegacyLogicalNot);
    assert_eq!(
        serialize_with_version(&expr, AstVersion::V0).to_string(),
        "(not_in (id a case_insensitive) (id b case_insensitive))"
    );
}

#[test]
fn wire_current_version_has_envelope() {
    let text = serialize_to_string(&parse("SELECT a FROM t"));
    assert!(text.starts_with("(ast (version 1) (root (term (exp (select (project (list"));
    assert_eq!(deserialize_str(&text).unwrap(), parse("SELECT a FROM t"));
}

#[test]
fn wire_v0_count_star() {
    let text = serialize_with_version(&parse("COUNT(*)"), AstVersion::V0).to_string();
    assert_eq!(text, "(meta (call_agg_wildcard count) {line: 1, column: 1})");
}

#[test]
fn wire_v0_reencodes_as_v1() {
    let v0 = serialize_with_version(&parse("SELECT a FROM t WHERE a NOT LIKE 'x'"), AstVersion::V0);
    let expr = deserialize(&v0).unwrap();
    let v1 = serialize(&expr);
    assert_eq!(v1.tag(), Some("ast"));
    assert_eq!(deserialize(&v1).unwrap(), expr);
}

#[test]
fn wire_pretty_text_reads_back() {
    let expr = parse("SELECT a, b FROM t WHERE a IN (SELECT VALUE c FROM u)");
    let pretty = serialize(&expr).to_pretty_string();
    assert!(pretty.contains('\n'));
    assert_eq!(deserialize_str(&pretty).unwrap(), expr);
}
