//! Ion-style data values.
//!
//! Literals in query text and the wire protocol share one value model:
//! scalars (null, bool, arbitrary-precision integers, exact decimals,
//! floats, strings, symbols) and containers (lists, s-expressions,
//! structs). [`read`] parses the text form and `Display` writes it back.

mod reader;
mod writer;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

pub use reader::{read, read_all, Reader, ValueError, DEFAULT_MAX_DEPTH};

/// Largest decimal exponent magnitude accepted, as in IEEE 754 decimal128.
const MAX_DECIMAL_EXPONENT: i64 = 6144;

/// A data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`, including typed nulls such as `null.int`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Arbitrary-precision integer.
    Int(BigInt),
    /// Arbitrary-precision exact decimal.
    Decimal(BigDecimal),
    /// Binary floating point.
    Float(f64),
    /// Unicode string.
    String(String),
    /// Symbol (an interned name in Ion).
    Symbol(String),
    /// Ordered list `[a, b]`.
    List(Vec<Value>),
    /// S-expression `(a b)`.
    Sexp(Vec<Value>),
    /// Struct `{k: v}`. Field order is preserved.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Creates an integer value.
    #[must_use]
    pub fn int(n: i64) -> Self {
        Self::Int(BigInt::from(n))
    }

    /// Creates a string value.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Creates a symbol value.
    #[must_use]
    pub fn symbol(s: impl Into<String>) -> Self {
        Self::Symbol(s.into())
    }

    /// Creates an s-expression whose head is the symbol `tag`.
    #[must_use]
    pub fn tagged(tag: &str, args: impl IntoIterator<Item = Self>) -> Self {
        let mut items = vec![Self::symbol(tag)];
        items.extend(args);
        Self::Sexp(items)
    }

    /// Returns the symbol text, if this is a symbol.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a string or symbol.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integer as an `i64` when it fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(ToPrimitive::to_i64)
    }

    /// Returns the elements of an s-expression.
    #[must_use]
    pub fn as_sexp(&self) -> Option<&[Self]> {
        match self {
            Self::Sexp(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the fields of a struct.
    #[must_use]
    pub fn as_struct(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up the first struct field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        self.as_struct()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, v)| v)
    }

    /// Returns the head symbol of an s-expression, if it has one.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.as_sexp()?.first()?.as_symbol()
    }

    /// Returns true for integers, decimals and floats.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Decimal(_) | Self::Float(_))
    }

    /// Returns the Ion type name of this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Decimal(_) => "decimal",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::List(_) => "list",
            Self::Sexp(_) => "sexp",
            Self::Struct(_) => "struct",
        }
    }

    /// Negates a numeric value. Returns `None` for non-numeric values.
    #[must_use]
    pub fn negate(&self) -> Option<Self> {
        match self {
            Self::Int(n) => Some(Self::Int(-n)),
            Self::Decimal(d) => Some(Self::Decimal(-d.clone())),
            Self::Float(f) => Some(Self::Float(-f)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::int(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Self::Int(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

/// Parses decimal text with an optional `e`/`d` exponent into an exact
/// decimal.
///
/// Accepts `1.5`, `.5`, `5.`, `1.5e-3` and `15d2`. Every digit is kept, so
/// `1.50` and `1.5` compare equal but print differently. Returns `None`
/// for malformed text or an exponent beyond
/// `MAX_DECIMAL_EXPONENT` in either direction.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let text: String = text.chars().filter(|&c| c != '_').collect();
    let (mantissa, exponent) = match text.find(|c: char| matches!(c, 'e' | 'E' | 'd' | 'D')) {
        Some(idx) => (&text[..idx], text[idx + 1..].parse::<i64>().ok()?),
        None => (text.as_str(), 0),
    };

    let (negative, body) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
    {
        return None;
    }

    if !(-MAX_DECIMAL_EXPONENT..=MAX_DECIMAL_EXPONENT).contains(&exponent) {
        return None;
    }
    let scale = i64::try_from(fraction.len()).ok()?.checked_sub(exponent)?;
    let coefficient = BigInt::parse_bytes(format!("{whole}{fraction}").as_bytes(), 10)?;
    let coefficient = if negative { -coefficient } else { coefficient };
    Some(BigDecimal::new(coefficient, scale))
}

/// Parses integer text (decimal, `0x` hex or `0b` binary, `_` separators)
/// into an arbitrary-precision integer.
#[must_use]
pub fn parse_int(text: &str) -> Option<BigInt> {
    let text: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    let hex = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"));
    let bin = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B"));
    let (radix, digits) = if let Some(hex) = hex {
        (16, hex)
    } else if let Some(bin) = bin {
        (2, bin)
    } else {
        (10, body)
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_decimal_forms() {
        assert_eq!(parse_decimal("1.5"), BigDecimal::from_str("1.5").ok());
        assert_eq!(parse_decimal(".5"), BigDecimal::from_str("0.5").ok());
        assert_eq!(parse_decimal("5."), BigDecimal::from_str("5").ok());
        assert_eq!(parse_decimal("1.5e-3"), BigDecimal::from_str("0.0015").ok());
        assert_eq!(parse_decimal("15d2"), BigDecimal::from_str("1500").ok());
        assert_eq!(parse_decimal("-2.25"), BigDecimal::from_str("-2.25").ok());
    }

    #[test]
    fn test_parse_decimal_beyond_machine_precision() {
        let d = parse_decimal("1e30").unwrap();
        assert_eq!(d.as_bigint_and_exponent(), (BigInt::from(1), -30));

        let d = parse_decimal("1e-40").unwrap();
        assert_eq!(d.as_bigint_and_exponent(), (BigInt::from(1), 40));

        let forty = "1234567890123456789012345678901234567890";
        let d = parse_decimal(&format!("{forty}.5")).unwrap();
        let (coefficient, scale) = d.as_bigint_and_exponent();
        assert_eq!(coefficient.to_string(), format!("{forty}5"));
        assert_eq!(scale, 1);
    }

    #[test]
    fn test_parse_decimal_rejects_malformed() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("1.2.3"), None);
        assert_eq!(parse_decimal("1e99999"), None);
        assert_eq!(parse_decimal("1e-99999"), None);
    }

    #[test]
    fn test_parse_int_radix() {
        assert_eq!(parse_int("42"), Some(BigInt::from(42)));
        assert_eq!(parse_int("-0x1F"), Some(BigInt::from(-31)));
        assert_eq!(parse_int("0b101"), Some(BigInt::from(5)));
        assert_eq!(parse_int("1_000"), Some(BigInt::from(1000)));
        assert_eq!(parse_int("0x"), None);
    }

    #[test]
    fn test_parse_int_beyond_i64() {
        let n = parse_int("123456789012345678901234567890").unwrap();
        assert_eq!(n.to_string(), "123456789012345678901234567890");
        assert_eq!(Value::Int(n).as_i64(), None);
    }

    #[test]
    fn test_tagged_and_tag() {
        let v = Value::tagged("lit", [Value::int(1)]);
        assert_eq!(v.tag(), Some("lit"));
        assert_eq!(v.as_sexp().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_negate() {
        assert_eq!(Value::int(3).negate(), Some(Value::int(-3)));
        assert_eq!(Value::string("x").negate(), None);
    }

    #[test]
    fn test_struct_field_lookup() {
        let v = Value::Struct(vec![
            ("line".to_string(), Value::int(1)),
            ("column".to_string(), Value::int(7)),
        ]);
        assert_eq!(v.field("column"), Some(&Value::int(7)));
        assert_eq!(v.field("length"), None);
    }
}
