//! Checksum salt.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An immutable value mixed into every checksum.
///
/// The salt is not a secret. It only makes frames written by a different
/// configuration (or hand-edited frames) fail verification.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Salt(Arc<str>);

impl Salt {
    /// Creates a salt from a string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    /// Derives a salt from a nested configuration value.
    ///
    /// Walks `path` through nested JSON objects and uses the leaf: strings
    /// are used verbatim, any other JSON value is used in its compact JSON
    /// form. Returns `None` if a segment is missing or the leaf is `null`.
    ///
    /// ```
    /// use docproxy_codec::Salt;
    /// use serde_json::json;
    ///
    /// let config = json!({ "file": { "info": "v1.4-build" } });
    /// let salt = Salt::from_config(&config, &["file", "info"]).unwrap();
    /// assert_eq!(salt.as_str(), "v1.4-build");
    /// ```
    #[must_use]
    pub fn from_config(config: &Value, path: &[&str]) -> Option<Self> {
        let leaf = path
            .iter()
            .try_fold(config, |node, key| node.as_object()?.get(*key))?;
        match leaf {
            Value::Null => None,
            Value::String(s) => Some(Self::new(s.as_str())),
            other => Some(Self::new(other.to_string())),
        }
    }

    /// Returns the salt as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Salt {
    fn default() -> Self {
        Self::new("")
    }
}

// Not secret, but keep it out of logs anyway.
impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({} chars)", self.0.chars().count())
    }
}

impl From<&str> for Salt {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Salt {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
