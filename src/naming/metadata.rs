//! Metadata values consumed by the naming template engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar metadata value.
///
/// Deserializes untagged, so JSON `1`, `1.5` and `"1"` map to
/// `Integer`, `Decimal` and `Text` respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Whole number, e.g. a publication year.
    Integer(i64),
    /// Decimal number, e.g. a novella's series position of `1.5`.
    Decimal(f64),
    /// Free text.
    Text(String),
}

impl MetadataValue {
    /// Formats the value as a series position.
    ///
    /// Whole-number decimals drop their fractional part (`1.0` -> `"1"`),
    /// other decimals keep their natural form (`1.5` -> `"1.5"`).
    #[must_use]
    pub fn series_position(&self) -> String {
        match self {
            Self::Decimal(value) if value.is_finite() && value.fract() == 0.0 => {
                format!("{value:.0}")
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            // Whole decimals keep a trailing ".0" so a decimal never reads as an integer.
            Self::Decimal(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

/// Case-insensitive mapping from metadata field names to optional values.
///
/// Keys are normalized to lowercase on insert and lookup. A key that is absent,
/// explicitly `None`, or whose value is blank after trimming all read as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Option<MetadataValue>>")]
pub struct MetadataBag {
    values: BTreeMap<String, MetadataValue>,
}

impl MetadataBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, replacing any value stored under the same key in any case.
    pub fn insert(&mut self, key: &str, value: impl Into<MetadataValue>) {
        self.values.insert(key.to_lowercase(), value.into());
    }

    /// Inserts `Some` values and removes the key for `None`.
    pub fn set<V: Into<MetadataValue>>(&mut self, key: &str, value: Option<V>) {
        match value {
            Some(value) => self.insert(key, value),
            None => {
                self.values.remove(&key.to_lowercase());
            }
        }
    }

    /// Looks up the raw value for a key, ignoring case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.values.get(&key.to_lowercase())
    }

    /// Returns the trimmed string form of a value, or `None` when missing or blank.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        let value = self.get(key)?.to_string();
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Returns true when no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Option<MetadataValue>>> for MetadataBag {
    fn from(map: BTreeMap<String, Option<MetadataValue>>) -> Self {
        let mut bag = Self::new();
        for (key, value) in map {
            bag.set(&key, value);
        }
        bag
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataBag
where
    K: AsRef<str>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key.as_ref(), value);
        }
        bag
    }
}
