//! Operator precedence for the expression parser.

use crate::ast::NAryOp;
use crate::lexer::{Operator, TokenKind};

/// Precedence of the set operators, the loosest binding infix operators.
///
/// Clause bodies are parsed above this level so that `UNION` ends a
/// `WHERE` expression instead of being absorbed by it.
pub const SET_OP_PRECEDENCE: u8 = 5;

/// Precedence of prefix `NOT`.
pub const NOT_PRECEDENCE: u8 = 30;

/// Precedence of prefix `+`, `-` and `@`.
pub const UNARY_PRECEDENCE: u8 = 100;

/// Returns the infix precedence for a token (higher binds tighter).
///
/// Returns `None` if the token is not an infix operator.
#[must_use]
pub const fn infix_precedence(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Operator(op) => match op {
            Operator::Union
            | Operator::UnionAll
            | Operator::Intersect
            | Operator::IntersectAll
            | Operator::Except
            | Operator::ExceptAll => Some(SET_OP_PRECEDENCE),
            Operator::Or => Some(10),
            Operator::And => Some(20),
            Operator::Eq | Operator::Ne => Some(40),
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => Some(50),
            Operator::Between
            | Operator::NotBetween
            | Operator::Like
            | Operator::NotLike
            | Operator::In
            | Operator::NotIn
            | Operator::Is
            | Operator::IsNot => Some(60),
            Operator::Concat => Some(70),
            Operator::Plus | Operator::Minus => Some(80),
            Operator::Slash | Operator::Percent => Some(90),
            Operator::Not | Operator::AtSign => None,
        },
        TokenKind::Star => Some(90),
        _ => None,
    }
}

/// Returns the prefix precedence for a token.
///
/// Returns `None` if the token is not a prefix operator.
#[must_use]
pub const fn prefix_precedence(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Operator(Operator::Not) => Some(NOT_PRECEDENCE),
        TokenKind::Operator(Operator::Plus | Operator::Minus | Operator::AtSign) => {
            Some(UNARY_PRECEDENCE)
        }
        _ => None,
    }
}

/// Converts an operator token to the n-ary operator it applies.
///
/// Negated forms map to their positive operator; the caller wraps the
/// result in `NOT`.
#[must_use]
pub const fn token_to_nary_op(kind: &TokenKind) -> Option<NAryOp> {
    let op = match kind {
        TokenKind::Operator(op) => op,
        TokenKind::Star => return Some(NAryOp::Mul),
        _ => return None,
    };
    Some(match op {
        Operator::Plus => NAryOp::Add,
        Operator::Minus => NAryOp::Sub,
        Operator::Slash => NAryOp::Div,
        Operator::Percent => NAryOp::Mod,
        Operator::Eq => NAryOp::Eq,
        Operator::Ne => NAryOp::Ne,
        Operator::Lt => NAryOp::Lt,
        Operator::Lte => NAryOp::Lte,
        Operator::Gt => NAryOp::Gt,
        Operator::Gte => NAryOp::Gte,
        Operator::Concat => NAryOp::StringConcat,
        Operator::And => NAryOp::And,
        Operator::Or => NAryOp::Or,
        Operator::Not => NAryOp::Not,
        Operator::In | Operator::NotIn => NAryOp::In,
        Operator::Like | Operator::NotLike => NAryOp::Like,
        Operator::Between | Operator::NotBetween => NAryOp::Between,
        Operator::Union => NAryOp::Union,
        Operator::UnionAll => NAryOp::UnionAll,
        Operator::Intersect => NAryOp::Intersect,
        Operator::IntersectAll => NAryOp::IntersectAll,
        Operator::Except => NAryOp::Except,
        Operator::ExceptAll => NAryOp::ExceptAll,
        Operator::Is | Operator::IsNot | Operator::AtSign => return None,
    })
}

/// Returns true for the merged `NOT x` operators.
#[must_use]
pub const fn is_negated(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Operator(
            Operator::NotIn | Operator::NotLike | Operator::NotBetween | Operator::IsNot
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(o: Operator) -> TokenKind {
        TokenKind::Operator(o)
    }

    #[test]
    fn test_precedence_ordering() {
        let add = infix_precedence(&op(Operator::Plus)).unwrap();
        let mul = infix_precedence(&TokenKind::Star).unwrap();
        assert!(mul > add);

        let and = infix_precedence(&op(Operator::And)).unwrap();
        let or = infix_precedence(&op(Operator::Or)).unwrap();
        assert!(and > or);

        let eq = infix_precedence(&op(Operator::Eq)).unwrap();
        assert!(eq > and);
        assert!(eq > NOT_PRECEDENCE);
        assert!(NOT_PRECEDENCE > and);

        let union = infix_precedence(&op(Operator::Union)).unwrap();
        assert!(union < or);
    }

    #[test]
    fn test_negated_forms_share_precedence() {
        assert_eq!(
            infix_precedence(&op(Operator::NotIn)),
            infix_precedence(&op(Operator::In))
        );
        assert_eq!(
            infix_precedence(&op(Operator::IsNot)),
            infix_precedence(&op(Operator::Is))
        );
    }

    #[test]
    fn test_not_is_prefix_only() {
        assert_eq!(infix_precedence(&op(Operator::Not)), None);
        assert_eq!(prefix_precedence(&op(Operator::Not)), Some(NOT_PRECEDENCE));
        assert_eq!(prefix_precedence(&op(Operator::Minus)), Some(UNARY_PRECEDENCE));
        assert_eq!(prefix_precedence(&op(Operator::Eq)), None);
    }

    #[test]
    fn test_token_to_nary_op() {
        assert_eq!(token_to_nary_op(&op(Operator::Plus)), Some(NAryOp::Add));
        assert_eq!(token_to_nary_op(&TokenKind::Star), Some(NAryOp::Mul));
        assert_eq!(token_to_nary_op(&op(Operator::NotIn)), Some(NAryOp::In));
        assert_eq!(token_to_nary_op(&op(Operator::Is)), None);
        assert_eq!(token_to_nary_op(&TokenKind::LeftParen), None);
        assert!(is_negated(&op(Operator::NotLike)));
        assert!(!is_negated(&op(Operator::Like)));
    }
}
