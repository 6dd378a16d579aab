use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A bound (or default) value of an argument or option.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    String(String),
    List(Vec<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The scalar value, or the last element of a list.
    pub fn last_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            Value::List(items) => items.last().map(|s| s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl<const N: usize> From<[&str; N]> for Value {
    fn from(items: [&str; N]) -> Self {
        Value::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// The result of binding a token sequence against a definition.
///
/// Every declared argument and option has an entry: either what the command
/// line supplied or the declared default. Iteration follows declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParsedInput {
    arguments: IndexMap<String, Value>,
    options: IndexMap<String, Value>,
}

impl ParsedInput {
    pub(crate) fn new(arguments: IndexMap<String, Value>, options: IndexMap<String, Value>) -> Self {
        Self { arguments, options }
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn arguments(&self) -> &IndexMap<String, Value> {
        &self.arguments
    }

    pub fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Value::as_str)
    }

    pub fn list_argument(&self, name: &str) -> &[String] {
        self.argument(name).and_then(Value::as_list).unwrap_or(&[])
    }

    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    pub fn list_option(&self, name: &str) -> &[String] {
        self.option(name).and_then(Value::as_list).unwrap_or(&[])
    }

    /// Whether a boolean option is set. Missing or non-boolean options read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_serializes_untagged() {
        let v = Value::from(["a", "b"]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"["a","b"]"#);
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");

        let back: Value = serde_json::from_str("true").unwrap();
        assert_eq!(back, Value::Bool(true));
        let back: Value = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(back, Value::from("x"));
    }

    #[test]
    fn last_str_reads_scalars_and_lists() {
        assert_eq!(Value::from("x").last_str(), Some("x"));
        assert_eq!(Value::from(["a", "b"]).last_str(), Some("b"));
        assert_eq!(Value::List(vec![]).last_str(), None);
        assert_eq!(Value::Bool(true).last_str(), None);
    }
}
