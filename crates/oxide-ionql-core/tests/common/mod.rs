#![allow(dead_code)]

use oxide_ionql_core::ast::{DataManipulation, ExprKind, FromSourceKind, Select};
use oxide_ionql_core::parser::{ErrorCode, ParseError};
use oxide_ionql_core::{
    deserialize, deserialize_str, parse_statement, serialize_with_version, AstVersion, Error,
    Expr,
};

pub fn parse(sql: &str) -> Expr {
    parse_statement(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> Error {
    parse_statement(sql).expect_err(&format!("Expected parse error for: {sql}"))
}

/// Returns the parse error for `sql`, failing on lexer errors.
pub fn parse_error(sql: &str) -> ParseError {
    match parse_err(sql) {
        Error::Parse(e) => e,
        other => panic!("Expected parse error for: {sql}, got {other:?}"),
    }
}

pub fn error_code(sql: &str) -> ErrorCode {
    parse_error(sql).code
}

pub fn parse_select(sql: &str) -> Select {
    match parse(sql).kind {
        ExprKind::Select(s) => *s,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

pub fn parse_dml(sql: &str) -> DataManipulation {
    match parse(sql).kind {
        ExprKind::Dml(d) => *d,
        other => panic!("Expected DML, got {other:?}"),
    }
}

/// Returns the expression of a single, non-join FROM source.
pub fn source_expr(select: &Select) -> &Expr {
    match &select.from.kind {
        FromSourceKind::Expr { expr, .. } | FromSourceKind::Unpivot { expr, .. } => expr,
        other => panic!("Expected a single source, got {other:?}"),
    }
}

/// Verifies that `sql` survives serialization in both protocol versions,
/// through both the value and the text forms.
pub fn round_trip(sql: &str) {
    let expr = parse(sql);
    for version in [AstVersion::V0, AstVersion::V1] {
        let wire = serialize_with_version(&expr, version);
        let back = deserialize(&wire)
            .unwrap_or_else(|e| panic!("Failed to deserialize {version}: {wire}\nError: {e:?}"));
        assert_eq!(back, expr, "Round-trip failed in {version}.\n  Input: {sql}\n  Wire:  {wire}");

        let text = wire.to_string();
        let reread = deserialize_str(&text)
            .unwrap_or_else(|e| panic!("Failed to read {version}: {text}\nError: {e:?}"));
        assert_eq!(reread, expr, "Text round-trip failed in {version}: {text}");
    }
}
