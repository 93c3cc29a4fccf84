//! The lexer's state transition table.
//!
//! Each state names the token it would produce if the token ended there,
//! how buffered text becomes a literal, and where each character class
//! leads. Characters without an explicit transition follow the state's
//! delegate, so continuation states fall back to `Initial` (which starts
//! the next token) and the Ion sub-machine falls back to its body state.

use std::sync::LazyLock;

use super::TokenKind;

/// Role of a state in token boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateType {
    /// Between tokens.
    Initial,
    /// Begins a token that cannot end here.
    Start,
    /// Continues a token that may end here.
    Terminal,
    /// Begins a token that may end here.
    StartAndTerminal,
    /// Continues a token that cannot end here.
    Incomplete,
    /// No valid continuation.
    Error,
    /// End of input.
    End,
}

impl StateType {
    /// Entering a state of this type begins a new token.
    #[must_use]
    pub const fn begins_token(self) -> bool {
        matches!(self, Self::Start | Self::StartAndTerminal | Self::End)
    }

    /// Leaving a state of this type may end the current token.
    #[must_use]
    pub const fn ends_token(self) -> bool {
        matches!(self, Self::Terminal | Self::StartAndTerminal)
    }

    /// The current token is still open and cannot end here.
    #[must_use]
    pub const fn is_incomplete(self) -> bool {
        matches!(self, Self::Start | Self::Incomplete)
    }
}

/// Which routine converts buffered text into a token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexType {
    None,
    Integer,
    Decimal,
    SqString,
    DqString,
    Ion,
    Whitespace,
}

/// The token a state yields when flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Identifier text, reclassified by keyword lookup on flush.
    Identifier,
    QuotedIdentifier,
    /// Symbolic operator text, resolved by operator lookup on flush.
    Operator,
    Literal,
    IonLiteral,
    /// A token whose kind does not depend on its text.
    Fixed(TokenKind),
}

/// How the character that enters a state is buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// The character is consumed but not buffered.
    Drop,
}

/// A set of input code points. `None` input is the synthetic end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Exact(char),
    OneOf(&'static str),
    Digit,
    IdentStart,
    IdentPart,
    Whitespace,
    Newline,
    /// Any code point, excluding end of input.
    Any,
    EndOfInput,
}

impl CharClass {
    /// Returns true if `cp` belongs to this class.
    #[must_use]
    pub fn matches(self, cp: Option<char>) -> bool {
        let Some(c) = cp else {
            return self == Self::EndOfInput;
        };
        match self {
            Self::Exact(e) => c == e,
            Self::OneOf(set) => set.contains(c),
            Self::Digit => c.is_ascii_digit(),
            Self::IdentStart => c.is_ascii_alphabetic() || c == '_' || c == '$',
            Self::IdentPart => c.is_ascii_alphanumeric() || c == '_' || c == '$',
            Self::Whitespace => c.is_whitespace(),
            Self::Newline => c == '\n' || c == '\r',
            Self::Any => true,
            Self::EndOfInput => false,
        }
    }
}

/// State identifiers, used as indices into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateId {
    Initial,
    End,
    Error,

    Whitespace,
    WhitespaceCont,
    LineComment,
    BlockCommentBody,
    BlockCommentStar,
    BlockCommentEnd,

    IdentStart,
    IdentCont,

    Integer,
    IntegerCont,
    DecimalPoint,
    DecimalFraction,
    ExponentMark,
    ExponentSign,
    ExponentDigits,

    SqStart,
    SqBody,
    SqEnd,
    SqDoubled,
    DqStart,
    DqBody,
    DqEnd,
    DqDoubled,

    IonStart,
    IonBody,
    IonDq,
    IonDqEscape,
    IonSq,
    IonSqEscape,
    IonSlash,
    IonLineComment,
    IonBlockComment,
    IonBlockStar,
    IonEnd,

    Plus,
    Minus,
    Slash,
    Percent,
    Equals,
    Less,
    LessEquals,
    LessGreater,
    Greater,
    GreaterEquals,
    Bang,
    BangEquals,
    Pipe,
    PipePipe,
    AtSign,
    LeftDoubleAngle,
    RightDoubleAngle,

    Star,
    Dot,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    Comma,
    Colon,
    Semicolon,
    Question,
}

const STATE_COUNT: usize = StateId::Question as usize + 1;

/// One entry of the transition table.
#[derive(Debug, Clone)]
pub struct State {
    pub state_type: StateType,
    pub token_type: Option<TokenType>,
    pub lex_type: LexType,
    pub replacement: Option<Replacement>,
    transitions: Vec<(CharClass, StateId)>,
    delegate: Option<StateId>,
}

impl State {
    const fn new(state_type: StateType) -> Self {
        Self {
            state_type,
            token_type: None,
            lex_type: LexType::None,
            replacement: None,
            transitions: Vec::new(),
            delegate: None,
        }
    }

    fn token(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    fn lex(mut self, lex_type: LexType) -> Self {
        self.lex_type = lex_type;
        self
    }

    fn drop_char(mut self) -> Self {
        self.replacement = Some(Replacement::Drop);
        self
    }

    fn on(mut self, class: CharClass, target: StateId) -> Self {
        self.transitions.push((class, target));
        self
    }

    fn delegate(mut self, target: StateId) -> Self {
        self.delegate = Some(target);
        self
    }
}

/// The full transition table.
pub struct StateTable {
    states: Vec<State>,
}

impl StateTable {
    /// Returns the state with the given id.
    #[must_use]
    pub fn get(&self, id: StateId) -> &State {
        &self.states[id as usize]
    }

    /// Follows the transition for `cp` from `from`, consulting delegates
    /// when the state has no matching transition of its own.
    #[must_use]
    pub fn next(&self, from: StateId, cp: Option<char>) -> StateId {
        let mut current = Some(from);
        while let Some(id) = current {
            let state = self.get(id);
            if let Some((_, target)) = state.transitions.iter().find(|(cls, _)| cls.matches(cp)) {
                return *target;
            }
            current = state.delegate;
        }
        StateId::Error
    }
}

/// The process-wide table, built on first use.
pub static TABLE: LazyLock<StateTable> = LazyLock::new(build);

#[allow(clippy::too_many_lines)]
fn build() -> StateTable {
    use CharClass::{
        Any, Digit, EndOfInput, Exact, IdentPart, IdentStart, Newline, OneOf, Whitespace,
    };
    use StateId as S;
    use StateType::{Error, Incomplete, Initial, Start, StartAndTerminal, Terminal};

    let fixed = |kind: TokenKind| State::new(StartAndTerminal).token(TokenType::Fixed(kind));
    let op_start = || State::new(StartAndTerminal).token(TokenType::Operator);
    let op_cont = || {
        State::new(Terminal)
            .token(TokenType::Operator)
            .delegate(S::Initial)
    };
    let literal = |lex: LexType| State::new(Terminal).token(TokenType::Literal).lex(lex);

    let mut entries: Vec<(StateId, State)> = vec![
        (
            S::Initial,
            State::new(Initial)
                .on(EndOfInput, S::End)
                .on(Whitespace, S::Whitespace)
                .on(IdentStart, S::IdentStart)
                .on(Digit, S::Integer)
                .on(Exact('\''), S::SqStart)
                .on(Exact('"'), S::DqStart)
                .on(Exact('`'), S::IonStart)
                .on(Exact('+'), S::Plus)
                .on(Exact('-'), S::Minus)
                .on(Exact('/'), S::Slash)
                .on(Exact('%'), S::Percent)
                .on(Exact('='), S::Equals)
                .on(Exact('<'), S::Less)
                .on(Exact('>'), S::Greater)
                .on(Exact('!'), S::Bang)
                .on(Exact('|'), S::Pipe)
                .on(Exact('@'), S::AtSign)
                .on(Exact('*'), S::Star)
                .on(Exact('.'), S::Dot)
                .on(Exact('('), S::LeftParen)
                .on(Exact(')'), S::RightParen)
                .on(Exact('['), S::LeftBracket)
                .on(Exact(']'), S::RightBracket)
                .on(Exact('{'), S::LeftCurly)
                .on(Exact('}'), S::RightCurly)
                .on(Exact(','), S::Comma)
                .on(Exact(':'), S::Colon)
                .on(Exact(';'), S::Semicolon)
                .on(Exact('?'), S::Question),
        ),
        (S::End, State::new(StateType::End)),
        (S::Error, State::new(Error)),
        // Whitespace and comments
        (
            S::Whitespace,
            State::new(StartAndTerminal)
                .lex(LexType::Whitespace)
                .on(Whitespace, S::WhitespaceCont)
                .delegate(S::Initial),
        ),
        (
            S::WhitespaceCont,
            State::new(Terminal)
                .lex(LexType::Whitespace)
                .on(Whitespace, S::WhitespaceCont)
                .delegate(S::Initial),
        ),
        (
            S::LineComment,
            State::new(Terminal)
                .lex(LexType::Whitespace)
                .on(Newline, S::WhitespaceCont)
                .on(Any, S::LineComment)
                .delegate(S::Initial),
        ),
        (
            S::BlockCommentBody,
            State::new(Incomplete)
                .lex(LexType::Whitespace)
                .on(Exact('*'), S::BlockCommentStar)
                .on(Any, S::BlockCommentBody),
        ),
        (
            S::BlockCommentStar,
            State::new(Incomplete)
                .lex(LexType::Whitespace)
                .on(Exact('/'), S::BlockCommentEnd)
                .on(Exact('*'), S::BlockCommentStar)
                .on(Any, S::BlockCommentBody),
        ),
        (
            S::BlockCommentEnd,
            State::new(Terminal)
                .lex(LexType::Whitespace)
                .delegate(S::Initial),
        ),
        // Identifiers
        (
            S::IdentStart,
            State::new(StartAndTerminal)
                .token(TokenType::Identifier)
                .on(IdentPart, S::IdentCont)
                .delegate(S::Initial),
        ),
        (
            S::IdentCont,
            State::new(Terminal)
                .token(TokenType::Identifier)
                .on(IdentPart, S::IdentCont)
                .delegate(S::Initial),
        ),
        // Numbers
        (
            S::Integer,
            State::new(StartAndTerminal)
                .token(TokenType::Literal)
                .lex(LexType::Integer)
                .on(Digit, S::IntegerCont)
                .on(Exact('.'), S::DecimalPoint)
                .on(OneOf("eE"), S::ExponentMark)
                .delegate(S::Initial),
        ),
        (
            S::IntegerCont,
            literal(LexType::Integer)
                .on(Digit, S::IntegerCont)
                .on(Exact('.'), S::DecimalPoint)
                .on(OneOf("eE"), S::ExponentMark)
                .delegate(S::Initial),
        ),
        (
            S::DecimalPoint,
            literal(LexType::Decimal)
                .on(Digit, S::DecimalFraction)
                .on(OneOf("eE"), S::ExponentMark)
                .delegate(S::Initial),
        ),
        (
            S::DecimalFraction,
            literal(LexType::Decimal)
                .on(Digit, S::DecimalFraction)
                .on(OneOf("eE"), S::ExponentMark)
                .delegate(S::Initial),
        ),
        (
            S::ExponentMark,
            State::new(Incomplete)
                .token(TokenType::Literal)
                .lex(LexType::Decimal)
                .on(OneOf("+-"), S::ExponentSign)
                .on(Digit, S::ExponentDigits),
        ),
        (
            S::ExponentSign,
            State::new(Incomplete)
                .token(TokenType::Literal)
                .lex(LexType::Decimal)
                .on(Digit, S::ExponentDigits),
        ),
        (
            S::ExponentDigits,
            literal(LexType::Decimal)
                .on(Digit, S::ExponentDigits)
                .delegate(S::Initial),
        ),
        // 'strings' with '' as an escaped quote
        (
            S::SqStart,
            State::new(Start)
                .token(TokenType::Literal)
                .lex(LexType::SqString)
                .drop_char()
                .on(Exact('\''), S::SqEnd)
                .on(Any, S::SqBody),
        ),
        (
            S::SqBody,
            State::new(Incomplete)
                .token(TokenType::Literal)
                .lex(LexType::SqString)
                .on(Exact('\''), S::SqEnd)
                .on(Any, S::SqBody),
        ),
        (
            S::SqEnd,
            literal(LexType::SqString)
                .on(Exact('\''), S::SqDoubled)
                .delegate(S::Initial),
        ),
        (
            S::SqDoubled,
            State::new(Incomplete)
                .token(TokenType::Literal)
                .lex(LexType::SqString)
                .drop_char()
                .on(Exact('\''), S::SqEnd)
                .on(Any, S::SqBody),
        ),
        // "quoted identifiers" with "" as an escaped quote
        (
            S::DqStart,
            State::new(Start)
                .token(TokenType::QuotedIdentifier)
                .lex(LexType::DqString)
                .drop_char()
                .on(Exact('"'), S::DqEnd)
                .on(Any, S::DqBody),
        ),
        (
            S::DqBody,
            State::new(Incomplete)
                .token(TokenType::QuotedIdentifier)
                .lex(LexType::DqString)
                .on(Exact('"'), S::DqEnd)
                .on(Any, S::DqBody),
        ),
        (
            S::DqEnd,
            State::new(Terminal)
                .token(TokenType::QuotedIdentifier)
                .lex(LexType::DqString)
                .on(Exact('"'), S::DqDoubled)
                .delegate(S::Initial),
        ),
        (
            S::DqDoubled,
            State::new(Incomplete)
                .token(TokenType::QuotedIdentifier)
                .lex(LexType::DqString)
                .drop_char()
                .on(Exact('"'), S::DqEnd)
                .on(Any, S::DqBody),
        ),
        // `ion` literals; nested quotes and comments may contain backticks
        (
            S::IonStart,
            State::new(Start)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .drop_char()
                .delegate(S::IonBody),
        ),
        (
            S::IonBody,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('`'), S::IonEnd)
                .on(Exact('"'), S::IonDq)
                .on(Exact('\''), S::IonSq)
                .on(Exact('/'), S::IonSlash)
                .on(Any, S::IonBody),
        ),
        (
            S::IonDq,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('"'), S::IonBody)
                .on(Exact('\\'), S::IonDqEscape)
                .on(Any, S::IonDq),
        ),
        (
            S::IonDqEscape,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Any, S::IonDq),
        ),
        (
            S::IonSq,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('\''), S::IonBody)
                .on(Exact('\\'), S::IonSqEscape)
                .on(Any, S::IonSq),
        ),
        (
            S::IonSqEscape,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Any, S::IonSq),
        ),
        (
            S::IonSlash,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('/'), S::IonLineComment)
                .on(Exact('*'), S::IonBlockComment)
                .delegate(S::IonBody),
        ),
        (
            S::IonLineComment,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Newline, S::IonBody)
                .on(Any, S::IonLineComment),
        ),
        (
            S::IonBlockComment,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('*'), S::IonBlockStar)
                .on(Any, S::IonBlockComment),
        ),
        (
            S::IonBlockStar,
            State::new(Incomplete)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .on(Exact('/'), S::IonBody)
                .on(Exact('*'), S::IonBlockStar)
                .on(Any, S::IonBlockComment),
        ),
        (
            S::IonEnd,
            State::new(Terminal)
                .token(TokenType::IonLiteral)
                .lex(LexType::Ion)
                .delegate(S::Initial),
        ),
        // Operators
        (S::Plus, op_start().delegate(S::Initial)),
        (
            S::Minus,
            op_start()
                .on(Exact('-'), S::LineComment)
                .delegate(S::Initial),
        ),
        (
            S::Slash,
            op_start()
                .on(Exact('*'), S::BlockCommentBody)
                .delegate(S::Initial),
        ),
        (S::Percent, op_start().delegate(S::Initial)),
        (S::Equals, op_start().delegate(S::Initial)),
        (
            S::Less,
            op_start()
                .on(Exact('='), S::LessEquals)
                .on(Exact('>'), S::LessGreater)
                .on(Exact('<'), S::LeftDoubleAngle)
                .delegate(S::Initial),
        ),
        (S::LessEquals, op_cont()),
        (S::LessGreater, op_cont()),
        (
            S::Greater,
            op_start()
                .on(Exact('='), S::GreaterEquals)
                .on(Exact('>'), S::RightDoubleAngle)
                .delegate(S::Initial),
        ),
        (S::GreaterEquals, op_cont()),
        (
            S::Bang,
            State::new(Start)
                .token(TokenType::Operator)
                .on(Exact('='), S::BangEquals),
        ),
        (S::BangEquals, op_cont()),
        (
            S::Pipe,
            State::new(Start)
                .token(TokenType::Operator)
                .on(Exact('|'), S::PipePipe),
        ),
        (S::PipePipe, op_cont()),
        (S::AtSign, op_start().delegate(S::Initial)),
        (
            S::LeftDoubleAngle,
            State::new(Terminal)
                .token(TokenType::Fixed(TokenKind::LeftDoubleAngle))
                .delegate(S::Initial),
        ),
        (
            S::RightDoubleAngle,
            State::new(Terminal)
                .token(TokenType::Fixed(TokenKind::RightDoubleAngle))
                .delegate(S::Initial),
        ),
        // Punctuation
        (S::Star, fixed(TokenKind::Star).delegate(S::Initial)),
        (
            S::Dot,
            fixed(TokenKind::Dot)
                .on(Digit, S::DecimalFraction)
                .delegate(S::Initial),
        ),
        (S::LeftParen, fixed(TokenKind::LeftParen).delegate(S::Initial)),
        (S::RightParen, fixed(TokenKind::RightParen).delegate(S::Initial)),
        (S::LeftBracket, fixed(TokenKind::LeftBracket).delegate(S::Initial)),
        (S::RightBracket, fixed(TokenKind::RightBracket).delegate(S::Initial)),
        (S::LeftCurly, fixed(TokenKind::LeftCurly).delegate(S::Initial)),
        (S::RightCurly, fixed(TokenKind::RightCurly).delegate(S::Initial)),
        (S::Comma, fixed(TokenKind::Comma).delegate(S::Initial)),
        (S::Colon, fixed(TokenKind::Colon).delegate(S::Initial)),
        (S::Semicolon, fixed(TokenKind::Semicolon).delegate(S::Initial)),
        (S::Question, fixed(TokenKind::Question).delegate(S::Initial)),
    ];

    entries.sort_by_key(|(id, _)| *id as usize);
    debug_assert_eq!(entries.len(), STATE_COUNT);
    debug_assert!(entries
        .iter()
        .enumerate()
        .all(|(i, (id, _))| *id as usize == i));
    StateTable {
        states: entries.into_iter().map(|(_, state)| state).collect(),
    }
}
