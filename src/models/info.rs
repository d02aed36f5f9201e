use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Nested key/value payload describing a device, keyed by field name.
pub type InfoMap = BTreeMap<String, InfoValue>;

/// A leaf or branch of the device info payload.
///
/// Serializes untagged, so a map of these renders as the plain JSON object
/// the server expects (`Null` becomes `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
    Null,
    Number(f64),
    String(String),
    Map(InfoMap),
}

impl InfoValue {
    pub fn is_null(&self) -> bool {
        matches!(self, InfoValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&InfoMap> {
        match self {
            InfoValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Follow a path of map keys, e.g. `["app", "token"]`.
    pub fn pointer(&self, path: &[&str]) -> Option<&InfoValue> {
        path.iter()
            .try_fold(self, |value, key| value.as_map()?.get(*key))
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::String(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::String(value)
    }
}

impl From<f64> for InfoValue {
    fn from(value: f64) -> Self {
        InfoValue::Number(value)
    }
}

impl From<InfoMap> for InfoValue {
    fn from(map: InfoMap) -> Self {
        InfoValue::Map(map)
    }
}

/// Build an [`InfoMap`] from `(key, value)` pairs.
pub(crate) fn info_map<const N: usize>(entries: [(&str, InfoValue); N]) -> InfoMap {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
