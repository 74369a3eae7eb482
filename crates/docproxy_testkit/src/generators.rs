//! Property-based test generators using proptest.
//!
//! Provides strategies for generating JSON documents that satisfy the
//! proxy's structural rules.

use crate::fixtures::settings_v3;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating object keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating JSON scalars.
///
/// Floats are limited to finite values with an exact JSON round trip.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1_000_000i32..1_000_000).prop_map(|n| Value::from(f64::from(n) / 8.0)),
        ".{0,24}".prop_map(Value::from),
    ]
}

/// Strategy for generating arbitrary JSON values up to a small depth.
pub fn json_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Strategy for generating structurally valid documents at `version`.
pub fn document_strategy(version: u64) -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), json_strategy(), 0..8).prop_map(move |entries| {
        let mut map: Map<String, Value> = entries.into_iter().collect();
        map.insert("version".to_string(), Value::from(version));
        Value::Object(map)
    })
}

/// Strategy for generating valid current-version settings documents.
pub fn settings_strategy() -> impl Strategy<Value = Value> {
    (0u64..=100, "[a-z]{1,10}").prop_map(|(volume, theme)| settings_v3(volume, &theme))
}

/// Strategy for generating salts.
pub fn salt_strategy() -> impl Strategy<Value = String> {
    ".{0,32}"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SettingsSchema;
    use docproxy_core::{document_version, verify_basic_structure, verify_entry};

    proptest! {
        #[test]
        fn documents_are_structurally_valid(doc in document_strategy(7)) {
            prop_assert!(verify_basic_structure(&doc).is_good());
            prop_assert_eq!(document_version(&doc), Some(7));
        }

        #[test]
        fn settings_pass_verification(doc in settings_strategy()) {
            prop_assert!(verify_entry(&SettingsSchema::new(), &doc).is_good());
        }
    }
}
