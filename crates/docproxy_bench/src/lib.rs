//! Benchmark utilities.

use docproxy_core::{DocumentSchema, VerifyResult};
use serde_json::{json, Map, Value};

/// Generate a settings-like document with `entries` records.
///
/// Keys repeat across records, which is the shape key-table compaction
/// is meant for.
pub fn document(entries: usize) -> Value {
    let records: Vec<Value> = (0..entries)
        .map(|i| {
            json!({
                "identifier": format!("item-{i}"),
                "description": "a moderately long description string",
                "enabled": i % 2 == 0,
                "priority": i,
                "ratio": i as f64 / 4.0,
            })
        })
        .collect();
    json!({ "version": 1, "records": records })
}

/// Generate a flat document with `fields` distinct keys.
pub fn flat_document(fields: usize) -> Value {
    let mut map: Map<String, Value> = (0..fields)
        .map(|i| (format!("field_{i}"), Value::from(i)))
        .collect();
    map.insert("version".to_string(), Value::from(1u64));
    Value::Object(map)
}

/// A schema accepting any version 1 document.
#[derive(Debug, Default)]
pub struct AnyDocument;

impl DocumentSchema for AnyDocument {
    fn current_version(&self) -> u64 {
        1
    }

    fn default_data(&self) -> Value {
        document(16)
    }

    fn verify(&self, _document: &Value) -> VerifyResult {
        VerifyResult::good()
    }
}
