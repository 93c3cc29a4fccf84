//! Tests for rejecting invalid serialized ASTs.

use oxide_ionql_core::ast::{ExprKind, Meta, SqlDataType, IS_SYNTHETIC_NAME_TAG, STATIC_TYPE_TAG};
use oxide_ionql_core::protocol::tags::Arity;
use oxide_ionql_core::protocol::{DeserializeOptions, Deserializer};
use oxide_ionql_core::value::read;
use oxide_ionql_core::{deserialize_str, AstVersion, Error, Expr, ProtocolError, Value};

fn protocol_err(text: &str) -> ProtocolError {
    match deserialize_str(text) {
        Err(Error::Protocol(e)) => e,
        other => panic!("Expected protocol error for: {text}, got {other:?}"),
    }
}

fn v1(root: &str) -> String {
    format!("(ast (version 1) (root {root}))")
}

// ===================================================================
// Envelope
// ===================================================================

#[test]
fn envelope_version_zero_is_accepted() {
    let expr = deserialize_str("(ast (version 0) (root (id a case_insensitive)))").unwrap();
    assert_eq!(expr, Expr::id("a"));
}

#[test]
fn envelope_unknown_version() {
    assert_eq!(
        protocol_err("(ast (version 2) (root (lit 1)))"),
        ProtocolError::UnsupportedVersion("2".to_string())
    );
}

#[test]
fn envelope_wrong_shape() {
    assert!(matches!(
        protocol_err("(ast (version 1))"),
        ProtocolError::ArityOutOfRange { found: 1, .. }
    ));
    assert!(matches!(
        protocol_err("(ast (root (lit 1)) (version 1))"),
        ProtocolError::Malformed(_)
    ));
}

#[test]
fn envelope_nested_in_tree() {
    assert!(matches!(
        protocol_err(&v1("(not (ast (version 1) (root (lit 1))))")),
        ProtocolError::Malformed(_)
    ));
}

// ===================================================================
// Tags and arity
// ===================================================================

#[test]
fn unknown_tag() {
    assert_eq!(
        protocol_err("(frobnicate (lit 1))"),
        ProtocolError::UnknownTag {
            tag: "frobnicate".to_string()
        }
    );
}

#[test]
fn tag_from_other_version() {
    let err = protocol_err(&v1("(@ (id a case_insensitive unqualified))"));
    assert_eq!(
        err,
        ProtocolError::TagNotInVersion {
            tag: "@".to_string(),
            version: AstVersion::V1,
        }
    );
    assert_eq!(err.to_string(), "tag '@' is not valid in AST version 1");

    assert!(matches!(
        protocol_err("(term (exp (missing)))"),
        ProtocolError::TagNotInVersion { .. }
    ));
}

#[test]
fn arity_out_of_range() {
    let err = protocol_err(&v1("(between (lit 1) (lit 2))"));
    assert_eq!(
        err,
        ProtocolError::ArityOutOfRange {
            tag: "between".to_string(),
            expected: Arity::exact(3),
            found: 2,
        }
    );
    assert_eq!(err.to_string(), "tag 'between' takes 3 arguments, found 2");
}

#[test]
fn raw_arguments_are_not_walked() {
    let expr = deserialize_str(&v1("(lit (frobnicate 1))")).unwrap();
    assert_eq!(
        expr.kind,
        ExprKind::Literal(Value::Sexp(vec![Value::symbol("frobnicate"), Value::int(1)]))
    );
}

#[test]
fn validation_covers_the_whole_tree() {
    let value = read("(and (lit true) (select (project (list (star))) (from (id t case_insensitive))))")
        .unwrap();
    assert!(Deserializer::new().validate(&value, AstVersion::V0).is_ok());
    let err = Deserializer::new()
        .validate(&value, AstVersion::V1)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ArityOutOfRange { ref tag, .. } if tag == "id"));
}

// ===================================================================
// Construction
// ===================================================================

#[test]
fn malformed_content() {
    assert!(matches!(
        protocol_err(&v1("(id 1 case_insensitive unqualified)")),
        ProtocolError::Malformed(_)
    ));
    assert!(matches!(
        protocol_err(&v1("(id a loud unqualified)")),
        ProtocolError::Malformed(_)
    ));
    assert!(matches!(
        protocol_err(&v1("(cast (lit 1) (type integer 4))")),
        ProtocolError::Malformed(_)
    ));
    assert!(matches!(
        protocol_err(&v1("(searched_case (else (lit 1)))")),
        ProtocolError::Malformed(_)
    ));
}

#[test]
fn select_clause_order() {
    let from = "(from (id t case_insensitive unqualified))";
    let ok = v1(&format!(
        "(select (project (list (star))) {from} (where (lit true)) (limit (lit 1)))"
    ));
    assert!(deserialize_str(&ok).is_ok());

    let swapped = v1(&format!(
        "(select (project (list (star))) {from} (limit (lit 1)) (where (lit true)))"
    ));
    assert!(matches!(protocol_err(&swapped), ProtocolError::Malformed(_)));
}

// ===================================================================
// Metadata
// ===================================================================

#[test]
fn meta_outside_term_in_v1() {
    assert!(matches!(
        protocol_err(&v1("(meta (missing) {line: 1, column: 1})")),
        ProtocolError::Malformed(_)
    ));
}

#[test]
fn v0_meta_needs_location_struct() {
    assert!(matches!(
        protocol_err("(meta (missing) 3)"),
        ProtocolError::Malformed(_)
    ));
    assert!(matches!(
        protocol_err("(meta (missing) {line: 1})"),
        ProtocolError::Malformed(_)
    ));
}

#[test]
fn static_type_meta_decodes() {
    let expr = deserialize_str(&v1("(term (exp (missing)) (meta ($static_type integer)))")).unwrap();
    assert_eq!(
        expr.metas.get(STATIC_TYPE_TAG),
        Some(&Meta::StaticType(SqlDataType::Integer))
    );

    assert!(matches!(
        protocol_err(&v1("(term (exp (missing)) (meta ($static_type widget)))")),
        ProtocolError::Malformed(_)
    ));
}

#[test]
fn unknown_meta_is_kept() {
    let expr = deserialize_str(&v1("(term (exp (missing)) (meta ($note \"hi\")))")).unwrap();
    assert_eq!(
        expr.metas.get("$note"),
        Some(&Meta::Opaque {
            tag: "$note".to_string(),
            value: Value::string("hi"),
        })
    );
}

#[test]
fn custom_decoder_replaces_opaque() {
    let deserializer = Deserializer::new().with_decoder("$synthetic", |_| Ok(Meta::IsSyntheticName));
    let value = read(&v1("(term (exp (missing)) (meta ($synthetic true)))")).unwrap();
    let expr = deserializer.deserialize(&value).unwrap();
    assert_eq!(expr.metas.get(IS_SYNTHETIC_NAME_TAG), Some(&Meta::IsSyntheticName));
}

// ===================================================================
// Limits
// ===================================================================

#[test]
fn nesting_limit() {
    let deep = format!("{}(lit 1){}", "(not ".repeat(50), ")".repeat(50));
    let shallow = Deserializer::with_options(DeserializeOptions { max_depth: 20 });
    let value = read(&deep).unwrap();
    assert_eq!(
        shallow.deserialize(&value).unwrap_err(),
        ProtocolError::NestingTooDeep { max_depth: 20 }
    );
    assert!(Deserializer::new().deserialize(&value).is_ok());
}

#[test]
fn unreadable_text() {
    assert!(matches!(
        protocol_err("(lit 1"),
        ProtocolError::InvalidText(_)
    ));
}
