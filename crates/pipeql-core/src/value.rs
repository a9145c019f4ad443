//! Dynamically typed scalar values and the row/table shapes built from them.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

use crate::error::EvalError;

/// A single cell value.
///
/// All numeric literals are 64-bit floats; there is no separate integer type.
/// Booleans are never written as literals, they only arise from evaluating
/// comparisons, logical operators, or the `if` function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit float, the only numeric type
    Number(f64),
    /// Quoted strings and backtick symbols
    Text(String),
    /// Comparison and logical results
    Bool(bool),
    /// Absent or unknown
    Null,
}

/// One row: an ordered mapping from column name to value.
///
/// Column order is insertion order and is significant for display and for
/// wildcard merges (a later column of the same name overwrites the earlier
/// one in place).
pub type Row = IndexMap<String, Value>;

/// An in-memory table. Rows are not required to share a column set.
pub type Table = Vec<Row>;

impl Value {
    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce to a number for arithmetic. Numeric-looking text is accepted;
    /// anything else is a type error.
    pub fn to_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) => s
                .parse::<f64>()
                .map_err(|_| EvalError::NotNumeric(s.clone())),
            other => Err(EvalError::NotNumeric(other.to_string())),
        }
    }

    /// Truthiness for logical operators: booleans pass through, everything
    /// else is truthy unless it is null, numeric zero, or empty text.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Natural ordering where both sides support one, otherwise lexical
    /// comparison of the text rendering.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::Number(-1.5).truthy());
        assert!(!Value::Text(String::new()).truthy());
        assert!(Value::Text("x".to_string()).truthy());
    }

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(Value::Number(4.0).to_number().unwrap(), 4.0);
        assert_eq!(Value::Text("3.5".to_string()).to_number().unwrap(), 3.5);
        assert!(Value::Text("abc".to_string()).to_number().is_err());
        assert!(Value::Null.to_number().is_err());
        assert!(Value::Bool(true).to_number().is_err());
    }

    #[test]
    fn test_natural_ordering() {
        assert_eq!(
            Value::Number(1.0).compare(&Value::Number(2.0)),
            Ordering::Less
        );
        assert_eq!(
            Value::Text("a".to_string()).compare(&Value::Text("b".to_string())),
            Ordering::Less
        );
        assert_eq!(Value::Bool(false).compare(&Value::Bool(true)), Ordering::Less);
    }

    #[test]
    fn test_mixed_types_compare_lexically() {
        // "10" < "9" as text
        assert_eq!(
            Value::Number(10.0).compare(&Value::Text("9".to_string())),
            Ordering::Less
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(75000.0).to_string(), "75000");
        assert_eq!(Value::Number(0.1).to_string(), "0.1");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
