//! Data types named in `CAST` and `IS`.

use core::fmt;

/// The closed set of type names the language knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDataType {
    Missing,
    Null,
    Boolean,
    Smallint,
    Integer,
    /// Float with optional precision.
    Float,
    Real,
    DoublePrecision,
    /// Decimal with optional precision and scale.
    Decimal,
    /// Numeric with optional precision and scale.
    Numeric,
    Timestamp,
    /// Fixed-length character string with optional length.
    Character,
    /// Variable-length character string with optional length.
    CharacterVarying,
    String,
    Symbol,
    Clob,
    Blob,
    Struct,
    Tuple,
    List,
    Sexp,
    Bag,
}

impl SqlDataType {
    /// Looks up a type by name. Accepts the canonical wire names and the
    /// source aliases (`bool`, `int`, `dec`, `char`, `varchar`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "missing" => Self::Missing,
            "null" => Self::Null,
            "boolean" | "bool" => Self::Boolean,
            "smallint" => Self::Smallint,
            "integer" | "int" => Self::Integer,
            "float" => Self::Float,
            "real" => Self::Real,
            "double_precision" => Self::DoublePrecision,
            "decimal" | "dec" => Self::Decimal,
            "numeric" => Self::Numeric,
            "timestamp" => Self::Timestamp,
            "character" | "char" => Self::Character,
            "character_varying" | "varchar" => Self::CharacterVarying,
            "string" => Self::String,
            "symbol" => Self::Symbol,
            "clob" => Self::Clob,
            "blob" => Self::Blob,
            "struct" => Self::Struct,
            "tuple" => Self::Tuple,
            "list" => Self::List,
            "sexp" => Self::Sexp,
            "bag" => Self::Bag,
            _ => return None,
        })
    }

    /// Returns the canonical name used on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Smallint => "smallint",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Real => "real",
            Self::DoublePrecision => "double_precision",
            Self::Decimal => "decimal",
            Self::Numeric => "numeric",
            Self::Timestamp => "timestamp",
            Self::Character => "character",
            Self::CharacterVarying => "character_varying",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Clob => "clob",
            Self::Blob => "blob",
            Self::Struct => "struct",
            Self::Tuple => "tuple",
            Self::List => "list",
            Self::Sexp => "sexp",
            Self::Bag => "bag",
        }
    }

    /// Returns the inclusive range of type arguments accepted.
    #[must_use]
    pub const fn arity(&self) -> (usize, usize) {
        match self {
            Self::Float | Self::Character | Self::CharacterVarying => (0, 1),
            Self::Decimal | Self::Numeric => (0, 2),
            _ => (0, 0),
        }
    }

    /// Returns true if `count` arguments are acceptable.
    #[must_use]
    pub const fn accepts_args(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && count <= max
    }
}

impl fmt::Display for SqlDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type reference with its arguments, as in `DECIMAL(10, 2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub sql_type: SqlDataType,
    pub args: Vec<u32>,
}

impl DataType {
    /// Creates a type reference without arguments.
    #[must_use]
    pub const fn new(sql_type: SqlDataType) -> Self {
        Self {
            sql_type,
            args: Vec::new(),
        }
    }

    /// Creates a type reference with arguments.
    #[must_use]
    pub const fn with_args(sql_type: SqlDataType, args: Vec<u32>) -> Self {
        Self { sql_type, args }
    }

    /// Returns true if the argument count is within the type's range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sql_type.accepts_args(self.args.len())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(SqlDataType::from_name("INT"), Some(SqlDataType::Integer));
        assert_eq!(SqlDataType::from_name("varchar"), Some(SqlDataType::CharacterVarying));
        assert_eq!(SqlDataType::from_name("bool"), Some(SqlDataType::Boolean));
        assert_eq!(SqlDataType::from_name("bigint"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for ty in [
            SqlDataType::DoublePrecision,
            SqlDataType::CharacterVarying,
            SqlDataType::Bag,
            SqlDataType::Missing,
        ] {
            assert_eq!(SqlDataType::from_name(ty.name()), Some(ty));
        }
    }

    #[test]
    fn test_arity() {
        assert!(SqlDataType::Decimal.accepts_args(2));
        assert!(!SqlDataType::Decimal.accepts_args(3));
        assert!(SqlDataType::Float.accepts_args(1));
        assert!(!SqlDataType::Integer.accepts_args(1));
        assert!(DataType::with_args(SqlDataType::Character, vec![10]).is_valid());
        assert!(!DataType::with_args(SqlDataType::Boolean, vec![1]).is_valid());
    }

    #[test]
    fn test_display() {
        let ty = DataType::with_args(SqlDataType::Decimal, vec![10, 2]);
        assert_eq!(ty.to_string(), "decimal(10, 2)");
        assert_eq!(DataType::new(SqlDataType::Integer).to_string(), "integer");
    }
}
