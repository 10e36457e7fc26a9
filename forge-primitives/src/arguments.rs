//! Argument maps passed to compiled handlers.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{InvocationError, InvocationResult};

/// Name → value mapping supplied by a caller for one invocation.
///
/// A name that is not present is *absent*. An empty string is a present value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, String>);

impl Arguments {
    /// Creates an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Removes a value, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Returns the value supplied for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` when a value was supplied for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over supplied names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of supplied values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts a JSON object received from a remote caller.
    ///
    /// Strings are taken verbatim, numbers and booleans by their display form,
    /// and `null` is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::InvalidArgumentValue`] when the input is not
    /// an object or a member is an array or object.
    pub fn from_json(value: &Value) -> InvocationResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(object) => object,
            other => {
                return Err(InvocationError::InvalidArgumentValue {
                    name: "<arguments>".into(),
                    reason: format!("expected an object, got {}", json_kind(other)),
                });
            }
        };

        let mut arguments = Self::new();
        for (name, value) in object {
            match value {
                Value::Null => {}
                Value::String(text) => arguments.insert(name.clone(), text.clone()),
                Value::Bool(flag) => arguments.insert(name.clone(), flag.to_string()),
                Value::Number(number) => arguments.insert(name.clone(), number.to_string()),
                other => {
                    return Err(InvocationError::InvalidArgumentValue {
                        name: name.clone(),
                        reason: format!("expected a scalar, got {}", json_kind(other)),
                    });
                }
            }
        }
        Ok(arguments)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for Arguments {
    fn from(value: HashMap<String, String>) -> Self {
        value.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_scalars_from_json() {
        let args = Arguments::from_json(&json!({
            "name": "Sam",
            "count": 5,
            "loud": true,
            "skip": null,
        }))
        .unwrap();

        assert_eq!(args.get("name"), Some("Sam"));
        assert_eq!(args.get("count"), Some("5"));
        assert_eq!(args.get("loud"), Some("true"));
        assert!(!args.contains("skip"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn rejects_nested_values() {
        let err = Arguments::from_json(&json!({ "paths": ["a", "b"] })).unwrap_err();
        assert!(matches!(err, InvocationError::InvalidArgumentValue { name, .. } if name == "paths"));
    }

    #[test]
    fn null_input_is_empty() {
        assert!(Arguments::from_json(&Value::Null).unwrap().is_empty());
        assert!(Arguments::from_json(&json!("text")).is_err());
    }

    #[test]
    fn empty_string_is_present() {
        let args = Arguments::new().with("flag", "");
        assert!(args.contains("flag"));
        assert_eq!(args.get("flag"), Some(""));
    }
}
