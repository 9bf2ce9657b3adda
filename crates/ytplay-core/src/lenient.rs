//! Tolerant field decoders for daemon payloads.
//!
//! `#[serde(default)]` only covers a missing key. The daemon also sends
//! explicit `null`s and, across versions, the odd mistyped value; both decode
//! to the field's default here instead of failing the whole payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` or a value of the wrong shape becomes `T::default()`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Decode a list, dropping entries that do not decode as `T`.
///
/// Anything other than an array decodes as an empty list.
pub(crate) fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(Value::Array(items)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
