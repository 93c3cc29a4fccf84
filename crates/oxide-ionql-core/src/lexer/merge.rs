//! Folding of multi-word keywords and operators into single tokens.

use tracing::trace;

use super::{Keyword, Operator, Token, TokenKind};
use crate::value::Value;

/// Longest merge window.
const MAX_WINDOW: usize = 4;

/// What a matched window becomes.
#[derive(Debug, Clone, Copy)]
enum Merged {
    Keyword(Keyword),
    Operator(Operator),
    /// A multi-word type name, kept as an identifier.
    TypeName(&'static str),
}

/// The merge table: word sequences and their replacement.
const MERGES: &[(&[&str], Merged)] = &[
    (&["not", "in"], Merged::Operator(Operator::NotIn)),
    (&["not", "like"], Merged::Operator(Operator::NotLike)),
    (&["not", "between"], Merged::Operator(Operator::NotBetween)),
    (&["is", "not"], Merged::Operator(Operator::IsNot)),
    (&["union", "all"], Merged::Operator(Operator::UnionAll)),
    (&["intersect", "all"], Merged::Operator(Operator::IntersectAll)),
    (&["except", "all"], Merged::Operator(Operator::ExceptAll)),
    (&["group", "partial"], Merged::Keyword(Keyword::GroupPartial)),
    (&["inner", "join"], Merged::Keyword(Keyword::InnerJoin)),
    (&["left", "join"], Merged::Keyword(Keyword::LeftJoin)),
    (&["left", "outer", "join"], Merged::Keyword(Keyword::LeftJoin)),
    (&["right", "join"], Merged::Keyword(Keyword::RightJoin)),
    (&["right", "outer", "join"], Merged::Keyword(Keyword::RightJoin)),
    (&["full", "join"], Merged::Keyword(Keyword::OuterJoin)),
    (&["full", "outer", "join"], Merged::Keyword(Keyword::OuterJoin)),
    (&["outer", "join"], Merged::Keyword(Keyword::OuterJoin)),
    (&["cross", "join"], Merged::Keyword(Keyword::CrossJoin)),
    (&["left", "cross", "join"], Merged::Keyword(Keyword::LeftCrossJoin)),
    (&["left", "outer", "cross", "join"], Merged::Keyword(Keyword::LeftCrossJoin)),
    (&["right", "cross", "join"], Merged::Keyword(Keyword::RightCrossJoin)),
    (&["right", "outer", "cross", "join"], Merged::Keyword(Keyword::RightCrossJoin)),
    (&["full", "cross", "join"], Merged::Keyword(Keyword::OuterCrossJoin)),
    (&["full", "outer", "cross", "join"], Merged::Keyword(Keyword::OuterCrossJoin)),
    (&["outer", "cross", "join"], Merged::Keyword(Keyword::OuterCrossJoin)),
    (&["character", "varying"], Merged::TypeName("character_varying")),
    (&["double", "precision"], Merged::TypeName("double_precision")),
];

fn lookup(keys: &[Option<String>]) -> Option<Merged> {
    MERGES.iter().find_map(|(words, merged)| {
        let matches = words.len() == keys.len()
            && words
                .iter()
                .zip(keys)
                .all(|(word, key)| key.as_deref() == Some(*word));
        matches.then_some(*merged)
    })
}

/// Merges adjacent tokens per the merge table.
///
/// Windows are anchored at their last token and the stream is scanned
/// right to left, trying the longest window first, so `left outer join`
/// wins over `outer join`.
#[must_use]
pub fn merge_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let keys: Vec<Option<String>> = tokens.iter().map(Token::key).collect();
    let mut slots: Vec<Option<Token>> = tokens.into_iter().map(Some).collect();
    let mut merged_rev = Vec::with_capacity(slots.len());

    let mut end = slots.len();
    while end > 0 {
        let mut consumed = 1;
        for width in (2..=MAX_WINDOW.min(end)).rev() {
            let start = end - width;
            let Some(merged) = lookup(&keys[start..end]) else {
                continue;
            };
            let first = slots[start].take();
            let last = slots[end - 1].take();
            if let (Some(first), Some(last)) = (first, last) {
                merged_rev.push(build(merged, &first, &last));
                trace!(window = width, line = first.span.line, "merged tokens");
            }
            consumed = width;
            break;
        }
        if consumed == 1 {
            if let Some(token) = slots[end - 1].take() {
                merged_rev.push(token);
            }
        }
        end -= consumed;
    }

    merged_rev.reverse();
    merged_rev
}

fn build(merged: Merged, first: &Token, last: &Token) -> Token {
    let span = first.span.cover(last.span);
    match merged {
        Merged::Keyword(kw) => Token::new(
            TokenKind::Keyword(kw),
            Some(Value::symbol(kw.as_str())),
            span,
        ),
        Merged::Operator(op) => Token::new(
            TokenKind::Operator(op),
            Some(Value::symbol(op.as_str())),
            span,
        ),
        Merged::TypeName(name) => Token::new(TokenKind::Identifier, Some(Value::symbol(name)), span),
    }
}
