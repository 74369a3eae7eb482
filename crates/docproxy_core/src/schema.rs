//! Document schemas.

use crate::verify::VerifyResult;
use serde_json::Value;

/// Name of the mandatory version field.
pub const VERSION_FIELD: &str = "version";

/// The application side of a persisted document kind.
///
/// Implement this once per document kind (settings, savegame index, ...).
/// The proxy never interprets a document beyond its `version` field; all
/// other shape rules live here.
pub trait DocumentSchema: Send + Sync + 'static {
    /// The version every document is upgraded to before it is accepted.
    fn current_version(&self) -> u64;

    /// The document used when nothing is stored yet.
    ///
    /// Must carry `version == current_version()` and pass [`verify`].
    ///
    /// [`verify`]: DocumentSchema::verify
    fn default_data(&self) -> Value;

    /// Semantic validation of a document at the current version.
    fn verify(&self, document: &Value) -> VerifyResult;

    /// Upgrades `document` in place from its stored version to
    /// [`current_version`](DocumentSchema::current_version).
    ///
    /// Called at most once per read, and only when the stored version is
    /// lower than the current one. The whole upgrade happens in this call;
    /// see [`crate::MigrationChain`] for composing single-version steps.
    fn migrate(&self, document: &mut Value) -> VerifyResult {
        VerifyResult::bad(format!(
            "no migration from version {} to {}",
            document.get(VERSION_FIELD).unwrap_or(&Value::Null),
            self.current_version()
        ))
    }
}

/// Returns the `version` of a document if it is a non-negative integer.
#[must_use]
pub fn document_version(document: &Value) -> Option<u64> {
    document.get(VERSION_FIELD)?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Flat;

    impl DocumentSchema for Flat {
        fn current_version(&self) -> u64 {
            3
        }

        fn default_data(&self) -> Value {
            json!({ "version": 3 })
        }

        fn verify(&self, _document: &Value) -> VerifyResult {
            VerifyResult::good()
        }
    }

    #[test]
    fn version_extraction() {
        assert_eq!(document_version(&json!({ "version": 4 })), Some(4));
        assert_eq!(document_version(&json!({ "version": -4 })), None);
        assert_eq!(document_version(&json!({ "version": 4.0 })), None);
        assert_eq!(document_version(&json!({})), None);
        assert_eq!(document_version(&json!(null)), None);
    }

    #[test]
    fn default_migrate_refuses() {
        let mut doc = json!({ "version": 1 });
        let result = Flat.migrate(&mut doc);
        assert_eq!(result.reason(), Some("no migration from version 1 to 3"));
        assert_eq!(doc, json!({ "version": 1 }));
    }
}
