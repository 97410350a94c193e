use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ValidationError;

/// Entity key -> field map, the shape handed to subscribers.
pub type EntityMap = HashMap<String, FieldMap>;

/// Field name -> typed value.
pub type FieldMap = HashMap<String, FieldValue>;

/// A typed record field value.
///
/// The original directory records are schemaless strings; values here carry
/// an explicit tag so the store can enforce a declared schema on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl FieldValue {
    pub fn type_of(&self) -> FieldType {
        match self {
            FieldValue::Str(_) => FieldType::Str,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }

    /// Returns the inner string for `Str` values, `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Str,
    Int,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FieldType::Str => write!(f, "str"),
            FieldType::Int => write!(f, "int"),
            FieldType::Bool => write!(f, "bool"),
        }
    }
}

/// Field schema enforced by the record store on every write.
///
/// Fields absent from the schema are accepted as-is unless `strict` is set,
/// in which case undeclared fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: HashMap<String, FieldType>,

    #[serde(default)]
    pub strict: bool,
}

impl Schema {
    /// Validate one field update against the declared types.
    pub fn check(
        &self,
        field: &str,
        value: &FieldValue,
    ) -> std::result::Result<(), ValidationError> {
        match self.fields.get(field) {
            Some(expected) if *expected != value.type_of() => {
                Err(ValidationError::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.to_string(),
                    actual: value.type_of().to_string(),
                })
            }
            Some(_) => Ok(()),
            None if self.strict => Err(ValidationError::UndeclaredField {
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}
