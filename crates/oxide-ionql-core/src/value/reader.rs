//! Text reader for Ion-style values.

use thiserror::Error;

use super::{parse_decimal, parse_int, Value};

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 400;

/// An error produced while reading value text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ValueError {
    /// Description of the problem.
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// Reads a single value from `text`.
///
/// # Errors
///
/// Returns a [`ValueError`] if the text is not exactly one well-formed
/// value.
pub fn read(text: &str) -> Result<Value, ValueError> {
    Reader::new(text).read_single()
}

/// Reads every top-level value from `text`.
///
/// # Errors
///
/// Returns a [`ValueError`] on the first malformed value.
pub fn read_all(text: &str) -> Result<Vec<Value>, ValueError> {
    Reader::new(text).read_all()
}

/// Which container the reader is currently inside. Operator symbols are
/// only legal inside s-expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    TopLevel,
    Sexp,
    Other,
}

/// A reader over value text.
pub struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
    max_depth: usize,
}

impl Reader {
    /// Creates a reader for the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum container nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads exactly one value followed by end of input.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the input is empty, malformed, or has
    /// trailing content.
    pub fn read_single(mut self) -> Result<Value, ValueError> {
        self.skip_trivia()?;
        if self.peek().is_none() {
            return Err(self.error("expected a value, found end of input"));
        }
        let value = self.read_value(Context::TopLevel)?;
        self.skip_trivia()?;
        if self.peek().is_some() {
            return Err(self.error("unexpected content after value"));
        }
        Ok(value)
    }

    /// Reads all top-level values.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] on the first malformed value.
    pub fn read_all(mut self) -> Result<Vec<Value>, ValueError> {
        let mut values = vec![];
        loop {
            self.skip_trivia()?;
            if self.peek().is_none() {
                return Ok(values);
            }
            values.push(self.read_value(Context::TopLevel)?);
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' || (c == '\r' && self.peek() != Some('\n')) {
            self.line += 1;
            self.column = 1;
        } else if c != '\r' {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn error(&self, message: impl Into<String>) -> ValueError {
        ValueError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ValueError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ValueError> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }
            if self.starts_with("//") {
                while self.peek().is_some_and(|c| c != '\n' && c != '\r') {
                    self.advance();
                }
            } else if self.starts_with("/*") {
                let start = self.error("unterminated block comment");
                self.advance();
                self.advance();
                loop {
                    if self.starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }
                    if self.advance().is_none() {
                        return Err(start);
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn enter(&mut self) -> Result<(), ValueError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(format!(
                "values nested deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_value(&mut self, context: Context) -> Result<Value, ValueError> {
        let Some(c) = self.peek() else {
            return Err(self.error("expected a value, found end of input"));
        };
        let value = match c {
            '[' => self.read_list()?,
            '(' => self.read_sexp()?,
            '{' => self.read_struct()?,
            '"' => Value::String(self.read_short_string('"')?),
            '\'' if self.starts_with("'''") => Value::String(self.read_long_strings()?),
            '\'' => Value::Symbol(self.read_short_string('\'')?),
            '0'..='9' => self.read_number()?,
            '-' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number()?,
            '-' | '+' if self.starts_with_word(1, "inf") => {
                self.advance();
                for _ in 0..3 {
                    self.advance();
                }
                Value::Float(if c == '-' {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                })
            }
            c if is_identifier_start(c) => self.read_identifier(),
            c if is_operator_char(c) && context == Context::Sexp => {
                let mut text = String::new();
                while self.peek().is_some_and(is_operator_char) {
                    if self.starts_with("//") || self.starts_with("/*") {
                        break;
                    }
                    text.extend(self.advance());
                }
                Value::Symbol(text)
            }
            c => return Err(self.error(format!("unexpected character '{c}'"))),
        };
        self.reject_annotation()?;
        Ok(value)
    }

    /// Returns true when `word` appears at `offset` and is not followed by
    /// an identifier character.
    fn starts_with_word(&self, offset: usize, word: &str) -> bool {
        let len = word.chars().count();
        word.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(offset + i) == Some(c))
            && !self
                .peek_at(offset + len)
                .is_some_and(is_identifier_part)
    }

    fn reject_annotation(&mut self) -> Result<(), ValueError> {
        let save = (self.pos, self.line, self.column);
        self.skip_trivia()?;
        if self.starts_with("::") {
            return Err(self.error("annotations are not supported"));
        }
        (self.pos, self.line, self.column) = save;
        Ok(())
    }

    fn read_list(&mut self) -> Result<Value, ValueError> {
        self.enter()?;
        self.expect('[')?;
        let mut items = vec![];
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.advance();
                break;
            }
            items.push(self.read_value(Context::Other)?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(']') => {}
                _ => return Err(self.error("expected ',' or ']' in list")),
            }
        }
        self.leave();
        Ok(Value::List(items))
    }

    fn read_sexp(&mut self) -> Result<Value, ValueError> {
        self.enter()?;
        self.expect('(')?;
        let mut items = vec![];
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(')') => {
                    self.advance();
                    break;
                }
                None => return Err(self.error("unterminated s-expression")),
                Some(_) => items.push(self.read_value(Context::Sexp)?),
            }
        }
        self.leave();
        Ok(Value::Sexp(items))
    }

    fn read_struct(&mut self) -> Result<Value, ValueError> {
        self.enter()?;
        self.expect('{')?;
        let mut fields = vec![];
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.advance();
                break;
            }
            let key = self.read_field_name()?;
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            let value = self.read_value(Context::Other)?;
            fields.push((key, value));
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}' in struct")),
            }
        }
        self.leave();
        Ok(Value::Struct(fields))
    }

    fn read_field_name(&mut self) -> Result<String, ValueError> {
        match self.peek() {
            Some('"') => self.read_short_string('"'),
            Some('\'') if self.starts_with("'''") => self.read_long_strings(),
            Some('\'') => self.read_short_string('\''),
            Some(c) if is_identifier_start(c) => {
                let mut name = String::new();
                while self.peek().is_some_and(is_identifier_part) {
                    name.extend(self.advance());
                }
                Ok(name)
            }
            _ => Err(self.error("expected a struct field name")),
        }
    }

    fn read_identifier(&mut self) -> Value {
        let mut text = String::new();
        while self.peek().is_some_and(is_identifier_part) {
            text.extend(self.advance());
        }
        match text.as_str() {
            "null" => {
                if self.peek() == Some('.')
                    && self.peek_at(1).is_some_and(is_identifier_start)
                {
                    self.advance();
                    while self.peek().is_some_and(is_identifier_part) {
                        self.advance();
                    }
                }
                Value::Null
            }
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "nan" => Value::Float(f64::NAN),
            _ => Value::Symbol(text),
        }
    }

    fn read_number(&mut self) -> Result<Value, ValueError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.extend(self.advance());
        }
        let radix_prefix = self.peek() == Some('0')
            && self
                .peek_at(1)
                .is_some_and(|c| matches!(c, 'x' | 'X' | 'b' | 'B'));
        if radix_prefix {
            text.extend(self.advance());
            text.extend(self.advance());
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                text.extend(self.advance());
            }
        } else {
            self.take_digits(&mut text);
            if self.peek() == Some('.') {
                text.extend(self.advance());
                self.take_digits(&mut text);
            }
            if self
                .peek()
                .is_some_and(|c| matches!(c, 'e' | 'E' | 'd' | 'D'))
            {
                text.extend(self.advance());
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    text.extend(self.advance());
                }
                self.take_digits(&mut text);
            }
        }

        if self.peek().is_some_and(|c| !is_value_delimiter(c)) {
            return Err(self.error(format!("invalid numeric literal '{text}'")));
        }

        let invalid = || ValueError {
            message: format!("invalid numeric literal '{text}'"),
            line,
            column,
        };
        if radix_prefix {
            return parse_int(&text).map(Value::Int).ok_or_else(invalid);
        }
        if text.contains(['e', 'E']) {
            let cleaned: String = text.chars().filter(|&c| c != '_').collect();
            return cleaned
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid());
        }
        if text.contains(['.', 'd', 'D']) {
            return parse_decimal(&text).map(Value::Decimal).ok_or_else(invalid);
        }
        parse_int(&text).map(Value::Int).ok_or_else(invalid)
    }

    fn take_digits(&mut self, text: &mut String) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            text.extend(self.advance());
        }
    }

    /// Reads one or more adjacent `'''long'''` segments.
    fn read_long_strings(&mut self) -> Result<String, ValueError> {
        let mut out = String::new();
        while self.starts_with("'''") {
            let start = self.error("unterminated long string");
            for _ in 0..3 {
                self.advance();
            }
            loop {
                if self.starts_with("'''") {
                    for _ in 0..3 {
                        self.advance();
                    }
                    break;
                }
                match self.advance() {
                    None => return Err(start),
                    Some('\\') => self.read_escape(&mut out)?,
                    Some(c) => out.push(c),
                }
            }
            let save = (self.pos, self.line, self.column);
            self.skip_trivia()?;
            if !self.starts_with("'''") {
                (self.pos, self.line, self.column) = save;
            }
        }
        Ok(out)
    }

    fn read_short_string(&mut self, quote: char) -> Result<String, ValueError> {
        let start = self.error("unterminated quoted text");
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(start),
                Some(c) if c == quote => return Ok(out),
                Some('\n' | '\r') => return Err(self.error("newline in quoted text")),
                Some('\\') => self.read_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn read_escape(&mut self, out: &mut String) -> Result<(), ValueError> {
        let Some(c) = self.advance() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '\\' | '"' | '\'' | '/' | '?' => out.push(c),
            'x' => out.push(self.read_hex_escape(2)?),
            'u' => out.push(self.read_hex_escape(4)?),
            'U' => out.push(self.read_hex_escape(8)?),
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.advance();
                }
            }
            other => return Err(self.error(format!("invalid escape sequence '\\{other}'"))),
        }
        Ok(())
    }

    fn read_hex_escape(&mut self, digits: usize) -> Result<char, ValueError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid code point"))
    }
}

const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

const fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Characters that may form an operator symbol inside an s-expression.
pub(crate) const fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '%' | '&' | '*' | '+' | '-' | '.' | '/' | ';' | '<' | '=' | '>' | '?' | '@'
            | '^' | '`' | '|' | '~'
    )
}

fn is_value_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ')' | ']' | '}' | '/' | '"' | '\'' | '(' | '[' | '{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_read_scalars() {
        assert_eq!(read("null").unwrap(), Value::Null);
        assert_eq!(read("null.int").unwrap(), Value::Null);
        assert_eq!(read("true").unwrap(), Value::Bool(true));
        assert_eq!(read("42").unwrap(), Value::int(42));
        assert_eq!(read("-7").unwrap(), Value::int(-7));
        assert_eq!(read("0x10").unwrap(), Value::int(16));
        assert_eq!(
            read("1.25").unwrap(),
            Value::Decimal(BigDecimal::from_str("1.25").unwrap())
        );
        assert_eq!(
            read("5d0").unwrap(),
            Value::Decimal(BigDecimal::from_str("5").unwrap())
        );
        assert_eq!(read("1.5e3").unwrap(), Value::Float(1500.0));
        assert_eq!(read("-inf").unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(read("nan").unwrap(), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_read_strings_and_symbols() {
        assert_eq!(read(r#""a\"b\n""#).unwrap(), Value::string("a\"b\n"));
        assert_eq!(read("'hello world'").unwrap(), Value::symbol("hello world"));
        assert_eq!(read("foo_bar").unwrap(), Value::symbol("foo_bar"));
        assert_eq!(read("'''ab''' '''cd'''").unwrap(), Value::string("abcd"));
        assert_eq!(read(r#""é""#).unwrap(), Value::string("é"));
    }

    #[test]
    fn test_read_containers() {
        let v = read("{a: [1, 2,], 'b c': (x y)}").unwrap();
        assert_eq!(
            v,
            Value::Struct(vec![
                ("a".into(), Value::List(vec![Value::int(1), Value::int(2)])),
                (
                    "b c".into(),
                    Value::Sexp(vec![Value::symbol("x"), Value::symbol("y")])
                ),
            ])
        );
    }

    #[test]
    fn test_read_operator_symbols_in_sexp() {
        let v = read("(<= (lit 1) (lit 2))").unwrap();
        assert_eq!(v.tag(), Some("<="));
        let v = read("(|| a b)").unwrap();
        assert_eq!(v.tag(), Some("||"));
        assert!(read("<=").is_err());
    }

    #[test]
    fn test_read_comments() {
        let v = read("( a // trailing\n /* block */ b )").unwrap();
        assert_eq!(v, Value::Sexp(vec![Value::symbol("a"), Value::symbol("b")]));
    }

    #[test]
    fn test_read_errors_have_positions() {
        let err = read("[1, 2").unwrap_err();
        assert_eq!(err.line, 1);
        let err = read("\n  \"abc").unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));
        assert!(read("a::b").is_err());
        assert!(read("12abc").is_err());
        assert!(read("1 2").is_err());
    }

    #[test]
    fn test_read_depth_limit() {
        let deep = format!("{}{}", "(".repeat(20), ")".repeat(20));
        assert!(Reader::new(&deep).with_max_depth(10).read_single().is_err());
        assert!(Reader::new(&deep).with_max_depth(30).read_single().is_ok());
    }

    #[test]
    fn test_read_all() {
        let values = read_all("1 two \"three\"").unwrap();
        assert_eq!(values.len(), 3);
    }
}
