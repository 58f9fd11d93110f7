//! Literal enumeration rows ("reference values").

use modelc_lang::Literal;
use serde::Serialize;

/// A literal value of a row or a field default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// One row of a fixed enumeration or administrable reference list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerationRow {
    /// Row name as declared.
    pub name: String,
    /// Property name to value, in declaration order.
    pub values: Vec<(String, Value)>,
}

impl EnumerationRow {
    /// Create an empty row.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Add a value.
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.push((field.into(), value));
        self
    }

    /// Value for a property, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = EnumerationRow::new("FR")
            .with_value("Code", Value::String("FR".into()))
            .with_value("Libelle", Value::String("France".into()));

        assert_eq!(row.get("Code"), Some(&Value::String("FR".into())));
        assert!(row.get("Ordre").is_none());
    }

    #[test]
    fn test_value_from_literal() {
        assert_eq!(Value::from(&Literal::Int(3)), Value::Int(3));
        assert_eq!(Value::from(&Literal::Null).to_string(), "null");
        assert_eq!(Value::from(&Literal::String("FR".into())).to_string(), "\"FR\"");
    }
}
