//! Text writer for Ion-style values.

use core::fmt::{self, Write};

use bigdecimal::BigDecimal;
use num_bigint::Sign;

use super::reader::is_operator_char;
use super::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, false)
    }
}

impl Value {
    /// Renders the value with nested s-expressions broken across lines.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_pretty(&mut out, self, 0, false);
        out
    }
}

fn write_value(out: &mut impl Write, value: &Value, in_sexp: bool) -> fmt::Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::Int(n) => write!(out, "{n}"),
        Value::Decimal(d) => write_decimal(out, d),
        Value::Float(x) => write_float(out, *x),
        Value::String(s) => write_quoted(out, s, '"'),
        Value::Symbol(s) => write_symbol(out, s, in_sexp),
        Value::List(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, item, false)?;
            }
            out.write_char(']')
        }
        Value::Sexp(items) => {
            out.write_char('(')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(' ')?;
                }
                write_value(out, item, true)?;
            }
            out.write_char(')')
        }
        Value::Struct(fields) => {
            out.write_char('{')?;
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_symbol(out, key, false)?;
                out.write_str(": ")?;
                write_value(out, item, false)?;
            }
            out.write_char('}')
        }
    }
}

/// Writes every stored digit. A point is placed inside the coefficient when
/// that needs few leading zeros; otherwise the `d` exponent form is used so
/// the text never reads back as a float.
fn write_decimal(out: &mut impl Write, d: &BigDecimal) -> fmt::Result {
    let (coefficient, scale) = d.as_bigint_and_exponent();
    let digits = coefficient.magnitude().to_string();
    let width = i64::try_from(digits.len()).unwrap_or(i64::MAX);
    if scale <= 0 || scale > width + 6 {
        return write!(out, "{coefficient}d{}", -scale);
    }
    if coefficient.sign() == Sign::Minus {
        out.write_char('-')?;
    }
    match usize::try_from(width - scale) {
        Ok(split) if split > 0 => write!(out, "{}.{}", &digits[..split], &digits[split..]),
        _ => {
            let zeros = usize::try_from(scale - width).unwrap_or(0);
            write!(out, "0.{}{digits}", "0".repeat(zeros))
        }
    }
}

fn write_pretty(out: &mut String, value: &Value, indent: usize, in_sexp: bool) -> fmt::Result {
    let Value::Sexp(items) = value else {
        return write_value(out, value, in_sexp);
    };
    let nested = items.iter().skip(1).any(|v| matches!(v, Value::Sexp(_)));
    if !nested {
        return write_value(out, value, in_sexp);
    }
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(&"  ".repeat(indent + 1));
        }
        write_pretty(out, item, indent + 1, true)?;
    }
    out.push(')');
    Ok(())
}

fn write_float(out: &mut impl Write, x: f64) -> fmt::Result {
    if x.is_nan() {
        out.write_str("nan")
    } else if x.is_infinite() {
        out.write_str(if x > 0.0 { "+inf" } else { "-inf" })
    } else {
        write!(out, "{x:e}")
    }
}

fn write_symbol(out: &mut impl Write, s: &str, in_sexp: bool) -> fmt::Result {
    if is_bare_identifier(s) || (in_sexp && !s.is_empty() && s.chars().all(is_operator_char)) {
        out.write_str(s)
    } else {
        write_quoted(out, s, '\'')
    }
}

fn is_bare_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !matches!(s, "null" | "true" | "false" | "nan")
}

fn write_quoted(out: &mut impl Write, s: &str, quote: char) -> fmt::Result {
    out.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if c == quote => {
                out.write_char('\\')?;
                out.write_char(c)?;
            }
            c if c.is_control() => write!(out, "\\u{:04x}", u32::from(c))?,
            c => out.write_char(c)?,
        }
    }
    out.write_char(quote)
}
