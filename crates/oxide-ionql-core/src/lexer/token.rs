//! Token types for the query lexer.

use super::Span;
use crate::value::Value;

/// Reserved words.
///
/// Composite keywords such as `LeftJoin` are produced by the merge pass
/// from several adjacent words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Query clauses
    Select,
    From,
    Where,
    Group,
    Partial,
    Having,
    Limit,
    Distinct,
    All,
    Value,
    Pivot,
    Unpivot,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,

    // Data manipulation and definition
    Insert,
    Into,
    Set,
    Remove,
    Update,
    Delete,
    Create,
    Drop,
    Table,
    Index,

    // Expression forms
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    Substring,
    Trim,
    Extract,
    Both,
    Leading,
    Trailing,
    Escape,

    // Produced by the merge pass
    GroupPartial,
    InnerJoin,
    LeftJoin,
    RightJoin,
    OuterJoin,
    CrossJoin,
    LeftCrossJoin,
    RightCrossJoin,
    OuterCrossJoin,
}

impl Keyword {
    /// Looks up a keyword by its lowercase spelling.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "select" => Self::Select,
            "from" => Self::From,
            "where" => Self::Where,
            "group" => Self::Group,
            "partial" => Self::Partial,
            "having" => Self::Having,
            "limit" => Self::Limit,
            "distinct" => Self::Distinct,
            "all" => Self::All,
            "value" => Self::Value,
            "pivot" => Self::Pivot,
            "unpivot" => Self::Unpivot,
            "join" => Self::Join,
            "inner" => Self::Inner,
            "left" => Self::Left,
            "right" => Self::Right,
            "full" => Self::Full,
            "outer" => Self::Outer,
            "cross" => Self::Cross,
            "on" => Self::On,
            "insert" => Self::Insert,
            "into" => Self::Into,
            "set" => Self::Set,
            "remove" => Self::Remove,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "create" => Self::Create,
            "drop" => Self::Drop,
            "table" => Self::Table,
            "index" => Self::Index,
            "case" => Self::Case,
            "when" => Self::When,
            "then" => Self::Then,
            "else" => Self::Else,
            "end" => Self::End,
            "cast" => Self::Cast,
            "substring" => Self::Substring,
            "trim" => Self::Trim,
            "extract" => Self::Extract,
            "both" => Self::Both,
            "leading" => Self::Leading,
            "trailing" => Self::Trailing,
            "escape" => Self::Escape,
            "group_partial" => Self::GroupPartial,
            "inner_join" => Self::InnerJoin,
            "left_join" => Self::LeftJoin,
            "right_join" => Self::RightJoin,
            "outer_join" => Self::OuterJoin,
            "cross_join" => Self::CrossJoin,
            "left_cross_join" => Self::LeftCrossJoin,
            "right_cross_join" => Self::RightCrossJoin,
            "outer_cross_join" => Self::OuterCrossJoin,
            _ => return None,
        })
    }

    /// Returns true for keywords that only the merge pass produces.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::GroupPartial
                | Self::InnerJoin
                | Self::LeftJoin
                | Self::RightJoin
                | Self::OuterJoin
                | Self::CrossJoin
                | Self::LeftCrossJoin
                | Self::RightCrossJoin
                | Self::OuterCrossJoin
        )
    }

    /// Returns the canonical lowercase spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Where => "where",
            Self::Group => "group",
            Self::Partial => "partial",
            Self::Having => "having",
            Self::Limit => "limit",
            Self::Distinct => "distinct",
            Self::All => "all",
            Self::Value => "value",
            Self::Pivot => "pivot",
            Self::Unpivot => "unpivot",
            Self::Join => "join",
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Full => "full",
            Self::Outer => "outer",
            Self::Cross => "cross",
            Self::On => "on",
            Self::Insert => "insert",
            Self::Into => "into",
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Drop => "drop",
            Self::Table => "table",
            Self::Index => "index",
            Self::Case => "case",
            Self::When => "when",
            Self::Then => "then",
            Self::Else => "else",
            Self::End => "end",
            Self::Cast => "cast",
            Self::Substring => "substring",
            Self::Trim => "trim",
            Self::Extract => "extract",
            Self::Both => "both",
            Self::Leading => "leading",
            Self::Trailing => "trailing",
            Self::Escape => "escape",
            Self::GroupPartial => "group_partial",
            Self::InnerJoin => "inner_join",
            Self::LeftJoin => "left_join",
            Self::RightJoin => "right_join",
            Self::OuterJoin => "outer_join",
            Self::CrossJoin => "cross_join",
            Self::LeftCrossJoin => "left_cross_join",
            Self::RightCrossJoin => "right_cross_join",
            Self::OuterCrossJoin => "outer_cross_join",
        }
    }
}

/// Operators, both symbolic and alphabetic.
///
/// `*` is lexed as [`TokenKind::Star`] because it also appears in
/// `SELECT *` and `COUNT(*)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Concat,
    /// `@`, forcing locals-first variable lookup.
    AtSign,
    And,
    Or,
    Not,
    Is,
    In,
    Like,
    Between,
    Union,
    Intersect,
    Except,

    // Produced by the merge pass
    NotIn,
    NotLike,
    NotBetween,
    IsNot,
    UnionAll,
    IntersectAll,
    ExceptAll,
}

impl Operator {
    /// Looks up an operator by its source spelling.
    #[must_use]
    pub fn from_text(s: &str) -> Option<Self> {
        Some(match s {
            "+" => Self::Plus,
            "-" => Self::Minus,
            "/" => Self::Slash,
            "%" => Self::Percent,
            "=" => Self::Eq,
            "<>" | "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "||" => Self::Concat,
            "@" => Self::AtSign,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "is" => Self::Is,
            "in" => Self::In,
            "like" => Self::Like,
            "between" => Self::Between,
            "union" => Self::Union,
            "intersect" => Self::Intersect,
            "except" => Self::Except,
            "not_in" => Self::NotIn,
            "not_like" => Self::NotLike,
            "not_between" => Self::NotBetween,
            "is_not" => Self::IsNot,
            "union_all" => Self::UnionAll,
            "intersect_all" => Self::IntersectAll,
            "except_all" => Self::ExceptAll,
            _ => return None,
        })
    }

    /// Returns the canonical spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Concat => "||",
            Self::AtSign => "@",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Is => "is",
            Self::In => "in",
            Self::Like => "like",
            Self::Between => "between",
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Except => "except",
            Self::NotIn => "not_in",
            Self::NotLike => "not_like",
            Self::NotBetween => "not_between",
            Self::IsNot => "is_not",
            Self::UnionAll => "union_all",
            Self::IntersectAll => "intersect_all",
            Self::ExceptAll => "except_all",
        }
    }

    /// Returns true for operators spelled as words, which the lexer
    /// recognizes from identifier text.
    #[must_use]
    pub const fn is_alphabetic(&self) -> bool {
        matches!(
            self,
            Self::And
                | Self::Or
                | Self::Not
                | Self::Is
                | Self::In
                | Self::Like
                | Self::Between
                | Self::Union
                | Self::Intersect
                | Self::Except
        )
    }
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    /// `<<`, opening a bag.
    LeftDoubleAngle,
    /// `>>`, closing a bag.
    RightDoubleAngle,

    /// Bare identifier; the value keeps the original case.
    Identifier,
    /// `"quoted"` identifier, matched case-sensitively.
    QuotedIdentifier,
    Operator(Operator),
    Keyword(Keyword),
    /// Number, string or boolean literal.
    Literal,
    /// Backtick-delimited Ion literal.
    IonLiteral,

    // Punctuation
    Colon,
    Comma,
    Dot,
    Star,
    Semicolon,
    Question,

    // Distinguished keywords
    As,
    At,
    By,
    For,
    Asc,
    Desc,
    Null,
    Missing,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns a short description for error messages.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::LeftBracket => "'['",
            Self::RightBracket => "']'",
            Self::LeftCurly => "'{'",
            Self::RightCurly => "'}'",
            Self::LeftDoubleAngle => "'<<'",
            Self::RightDoubleAngle => "'>>'",
            Self::Identifier => "identifier",
            Self::QuotedIdentifier => "quoted identifier",
            Self::Operator(op) => op.as_str(),
            Self::Keyword(kw) => kw.as_str(),
            Self::Literal => "literal",
            Self::IonLiteral => "Ion literal",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::Star => "'*'",
            Self::Semicolon => "';'",
            Self::Question => "'?'",
            Self::As => "as",
            Self::At => "at",
            Self::By => "by",
            Self::For => "for",
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Null => "null",
            Self::Missing => "missing",
            Self::Eof => "end of input",
        }
    }
}

/// A token with its kind, literal payload and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// Payload: the literal value, or the identifier/keyword text as a
    /// symbol.
    pub value: Option<Value>,
    /// The source location.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, value: Option<Value>, span: Span) -> Self {
        Self { kind, value, span }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this token is a keyword.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(_))
    }

    /// Returns the keyword if this token is one.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    /// Returns the operator if this token is one.
    #[must_use]
    pub const fn as_operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Returns the payload text of identifier, keyword and operator tokens.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_text)
    }

    /// Returns the lowercase text used to match this token against the
    /// merge table and function names. Quoted identifiers never match.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self.kind {
            TokenKind::Identifier => self.text().map(str::to_ascii_lowercase),
            TokenKind::Keyword(kw) => Some(kw.as_str().to_string()),
            TokenKind::Operator(op) => Some(op.as_str().to_string()),
            _ => None,
        }
    }
}
