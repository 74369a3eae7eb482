//! Object compaction: shrinking a document's shape before it is framed.
//!
//! Compaction runs on the parsed JSON tree, before checksumming and
//! compression. It must be lossless: `expand(compact(v)) == v`.

use crate::error::{CodecError, CodecResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Debug;

const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const MARKER_FIELD: &str = "$keytable";
const ENVELOPE_FORMAT: u64 = 1;
const KEYS_FIELD: &str = "keys";
const VALUES_FIELD: &str = "values";
const DATA_FIELD: &str = "data";

/// Shrinks and expands a document's in-memory shape.
pub trait Compaction: Send + Sync + Debug {
    /// Returns the compacted form of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if `value` cannot be compacted.
    fn compact(&self, value: &Value) -> CodecResult<Value>;

    /// Restores the full shape of a compacted value.
    ///
    /// Values that were never compacted must pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CompactionFailed`] if `value` looks compacted
    /// but cannot be expanded.
    fn expand(&self, value: Value) -> CodecResult<Value>;
}

/// Compaction that leaves documents untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompaction;

impl Compaction for IdentityCompaction {
    fn compact(&self, value: &Value) -> CodecResult<Value> {
        Ok(value.clone())
    }

    fn expand(&self, value: Value) -> CodecResult<Value> {
        Ok(value)
    }
}

/// Interns object keys and string values into lookup tables.
///
/// Documents with many repeated keys (arrays of records) or repeated
/// strings shrink considerably. The compacted form is
///
/// ```text
/// { "$keytable": 1, "keys": [<key>...], "values": [<string>...], "data": <tree> }
/// ```
///
/// where every object key and every string in `data` is replaced by a short
/// base-62 index into the matching table. Only a value carrying the
/// `$keytable` marker is expanded. Anything else, including a plain
/// document that happens to hold `keys`, `values` and `data` fields, is
/// treated as uncompacted and passed through as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTableCompaction;

#[derive(Default)]
struct Interner {
    index: HashMap<String, usize>,
    table: Vec<String>,
}

impl Interner {
    fn token(&mut self, s: &str) -> String {
        let next = self.table.len();
        let idx = *self.index.entry(s.to_string()).or_insert_with(|| next);
        if idx == next {
            self.table.push(s.to_string());
        }
        encode_token(idx)
    }

    fn into_value(self) -> Value {
        Value::Array(self.table.into_iter().map(Value::String).collect())
    }
}

fn encode_token(mut n: usize) -> String {
    let base = TOKEN_ALPHABET.len();
    let mut out = Vec::new();
    loop {
        out.push(TOKEN_ALPHABET[n % base]);
        n /= base;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    // Alphabet is ASCII.
    out.into_iter().map(char::from).collect()
}

fn decode_token(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    token.bytes().try_fold(0usize, |acc, b| {
        let digit = TOKEN_ALPHABET.iter().position(|&c| c == b)?;
        acc.checked_mul(TOKEN_ALPHABET.len())?.checked_add(digit)
    })
}

fn compact_tree(value: &Value, keys: &mut Interner, values: &mut Interner) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (keys.token(k), compact_tree(v, keys, values)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| compact_tree(v, keys, values))
                .collect(),
        ),
        Value::String(s) => Value::String(values.token(s)),
        other => other.clone(),
    }
}

fn lookup<'a>(table: &'a [String], token: &str, what: &str) -> CodecResult<&'a str> {
    decode_token(token)
        .and_then(|idx| table.get(idx))
        .map(String::as_str)
        .ok_or_else(|| CodecError::compaction_failed(format!("unknown {what} token {token:?}")))
}

fn expand_tree(value: Value, keys: &[String], values: &[String]) -> CodecResult<Value> {
    Ok(match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let key = lookup(keys, &k, "key")?;
                out.insert(key.to_string(), expand_tree(v, keys, values)?);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| expand_tree(v, keys, values))
                .collect::<CodecResult<_>>()?,
        ),
        Value::String(s) => Value::String(lookup(values, &s, "value")?.to_string()),
        other => other,
    })
}

fn string_table(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl Compaction for KeyTableCompaction {
    fn compact(&self, value: &Value) -> CodecResult<Value> {
        let mut keys = Interner::default();
        let mut values = Interner::default();
        let data = compact_tree(value, &mut keys, &mut values);

        let mut envelope = Map::with_capacity(4);
        envelope.insert(MARKER_FIELD.to_string(), Value::from(ENVELOPE_FORMAT));
        envelope.insert(KEYS_FIELD.to_string(), keys.into_value());
        envelope.insert(VALUES_FIELD.to_string(), values.into_value());
        envelope.insert(DATA_FIELD.to_string(), data);
        Ok(Value::Object(envelope))
    }

    fn expand(&self, value: Value) -> CodecResult<Value> {
        let mut envelope = match value {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        let marked = envelope.get(MARKER_FIELD).and_then(Value::as_u64) == Some(ENVELOPE_FORMAT);
        let tables = if marked && envelope.len() == 4 && envelope.contains_key(DATA_FIELD) {
            envelope
                .get(KEYS_FIELD)
                .and_then(string_table)
                .zip(envelope.get(VALUES_FIELD).and_then(string_table))
        } else {
            None
        };
        let Some((keys, values)) = tables else {
            return Ok(Value::Object(envelope));
        };
        let data = envelope.remove(DATA_FIELD).unwrap_or(Value::Null);
        expand_tree(data, &keys, &values)
    }
}
