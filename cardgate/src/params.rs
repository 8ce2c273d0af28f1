//! The gateway-native parsed reply.
//!
//! Adapters materialize whatever the processor sent back (form pairs, a JSON
//! document, an XML tree) into a [`Params`] map and keep it on the
//! [`Response`](crate::Response) for debugging. Generic code never interprets
//! it beyond key lookups.

use serde_json::Value;

/// Parsed processor reply: string keys mapping to string or nested values.
///
/// Backed by `serde_json::Map`, whose key order is sorted and therefore
/// deterministic across runs.
pub type Params = serde_json::Map<String, Value>;

/// Returns the value at `key` when it is a string.
#[must_use]
pub fn param_str<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Walks nested objects along `path` and returns the value at the end.
#[must_use]
pub fn param_path<'a>(params: &'a Params, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = params.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Like [`param_path`], but only returns string leaves.
#[must_use]
pub fn param_path_str<'a>(params: &'a Params, path: &[&str]) -> Option<&'a str> {
    param_path(params, path).and_then(Value::as_str)
}

/// Builds a [`Params`] map from string pairs, as produced by form decoding.
///
/// Later duplicates of a key overwrite earlier ones.
pub fn params_from_pairs<K, V, I>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

/// Converts a JSON value into [`Params`], returning `None` unless it is an object.
#[must_use]
pub fn params_from_value(value: Value) -> Option<Params> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
