use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared type of a table column.
///
/// This is the full supported type set. Adding a type means extending both
/// `ColumnType::from_str` and `parse_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Str => "str",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s {
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "bool" => Ok(Self::Bool),
            other => Err(DbError::UnsupportedType(other.to_owned())),
        }
    }
}

/// A typed cell value.
///
/// Serialized as a plain JSON scalar (number, string, or boolean), so the
/// persisted row files stay human-readable. There are no floats in the type
/// set, so `Eq` and `Hash` are derivable and values can key the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Coerce a raw token into a typed value.
///
/// - `str`: strips one layer of surrounding double quotes if present,
///   otherwise used verbatim (no interior escaping);
/// - `int`: strict base-10 parse;
/// - `bool`: case-insensitive `true`/`false` only.
///
/// Pure function; the raw token is trimmed before coercion.
pub fn parse_value(raw: &str, ty: ColumnType) -> DbResult<Value> {
    let raw = raw.trim();
    match ty {
        ColumnType::Str => {
            let s = raw
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(raw);
            Ok(Value::Str(s.to_owned()))
        }
        ColumnType::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| DbError::Validation(format!("invalid integer: {raw}"))),
        ColumnType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(DbError::Validation(format!("invalid boolean: {raw}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_round_trip() {
        for name in ["int", "str", "bool"] {
            let ty: ColumnType = name.parse().unwrap();
            assert_eq!(ty.name(), name);
        }
    }

    #[test]
    fn unsupported_type_rejected() {
        let err = "float".parse::<ColumnType>().unwrap_err();
        assert!(matches!(err, DbError::UnsupportedType(t) if t == "float"));
    }

    #[test]
    fn parse_int() {
        assert_eq!(parse_value("42", ColumnType::Int).unwrap(), Value::Int(42));
        assert_eq!(
            parse_value(" -7 ", ColumnType::Int).unwrap(),
            Value::Int(-7)
        );
        assert!(parse_value("42x", ColumnType::Int).is_err());
        assert!(parse_value("4.2", ColumnType::Int).is_err());
        assert!(parse_value("", ColumnType::Int).is_err());
    }

    #[test]
    fn parse_str_strips_one_quote_layer() {
        assert_eq!(
            parse_value("\"Ann\"", ColumnType::Str).unwrap(),
            Value::from("Ann")
        );
        assert_eq!(
            parse_value("plain", ColumnType::Str).unwrap(),
            Value::from("plain")
        );
        // Only one layer comes off.
        assert_eq!(
            parse_value("\"\"x\"\"", ColumnType::Str).unwrap(),
            Value::from("\"x\"")
        );
    }

    #[test]
    fn parse_bool_case_insensitive() {
        assert_eq!(
            parse_value("true", ColumnType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            parse_value("FALSE", ColumnType::Bool).unwrap(),
            Value::Bool(false)
        );
        assert!(parse_value("yes", ColumnType::Bool).is_err());
        assert!(parse_value("1", ColumnType::Bool).is_err());
    }

    #[test]
    fn json_scalar_shape() {
        assert_eq!(serde_json::to_string(&Value::Int(5)).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&Value::from("hi")).unwrap(),
            "\"hi\""
        );
        assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");

        let v: Value = serde_json::from_str("30").unwrap();
        assert_eq!(v, Value::Int(30));
        let v: Value = serde_json::from_str("\"Ann\"").unwrap();
        assert_eq!(v, Value::from("Ann"));
        let v: Value = serde_json::from_str("false").unwrap();
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::from("a").to_string(), "a");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
