use serde_json::{Map, Value};
use std::fmt;

/// Why a required field could not be taken from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldIssue {
    Missing,
    WrongType { expected: &'static str },
    WrongLength { expected: usize, got: usize },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing => write!(f, "missing"),
            FieldIssue::WrongType { expected } => write!(f, "expected {expected}"),
            FieldIssue::WrongLength { expected, got } => {
                write!(f, "expected {expected} elements, got {got}")
            }
        }
    }
}

/// Loosely-typed view over one record's JSON fields.
#[derive(Debug, Default)]
pub struct FieldMap {
    fields: Map<String, Value>,
}

impl FieldMap {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn require_string(&self, key: &str) -> Result<String, FieldIssue> {
        match self.fields.get(key) {
            None => Err(FieldIssue::Missing),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(FieldIssue::WrongType { expected: "string" }),
        }
    }

    /// Absent or non-string values yield `default`.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// A two-element numeric array, returned as `(first, second)`.
    pub fn number_pair(&self, key: &str) -> Result<(f64, f64), FieldIssue> {
        let items = match self.fields.get(key) {
            None => return Err(FieldIssue::Missing),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FieldIssue::WrongType { expected: "array" }),
        };
        match items.as_slice() {
            [first, second] => match (first.as_f64(), second.as_f64()) {
                (Some(a), Some(b)) => Ok((a, b)),
                _ => Err(FieldIssue::WrongType { expected: "number" }),
            },
            other => Err(FieldIssue::WrongLength {
                expected: 2,
                got: other.len(),
            }),
        }
    }

    /// String elements of an array field; anything else is dropped.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}
