//! Tri-state attribute values.
//!
//! Every attribute in a plan or state is either unset (`Null`), not yet known
//! because the provider computes it during apply (`Unknown`), or a concrete
//! value (`Known`). Keeping all three apart is what lets the provider tell
//! "the user never configured `note`" from "the server reported an empty
//! `note`".
//!
//! # JSON encoding
//!
//! - `Null` is `null` (or an absent key when deserializing)
//! - `Known(v)` is the plain JSON value
//! - `Unknown` is the string [`UNKNOWN_VALUE`], whatever the attribute's type
//!
//! ```
//! use hemmer_provider_zammad::value::{AttrValue, UNKNOWN_VALUE};
//!
//! let v: AttrValue<bool> = serde_json::from_value(serde_json::json!(UNKNOWN_VALUE)).unwrap();
//! assert!(v.is_unknown());
//! ```

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Placeholder for values that are only known after apply.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// A plan or state attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttrValue<T> {
    /// Not set in configuration or state.
    #[default]
    Null,
    /// Will be computed by the provider during apply.
    Unknown,
    /// A concrete value.
    Known(T),
}

impl<T> AttrValue<T> {
    /// Returns true if the value is unset.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value is not known until apply.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true if the value is concrete.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the concrete value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Clone + Default> AttrValue<T> {
    /// The concrete value, or the type's zero value for null and unknown.
    pub fn value_or_default(&self) -> T {
        self.value().cloned().unwrap_or_default()
    }
}

impl<T> From<T> for AttrValue<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl From<&str> for AttrValue<String> {
    fn from(value: &str) -> Self {
        Self::Known(value.to_string())
    }
}

impl<T: Serialize> Serialize for AttrValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Unknown => serializer.serialize_str(UNKNOWN_VALUE),
            Self::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for AttrValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Null => Ok(Self::Null),
            Value::String(ref s) if s == UNKNOWN_VALUE => Ok(Self::Unknown),
            other => serde_json::from_value(other)
                .map(Self::Known)
                .map_err(D::Error::custom),
        }
    }
}

/// Returns true if a raw JSON value is the unknown placeholder.
pub fn is_unknown_json(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == UNKNOWN_VALUE)
}

/// The raw JSON form of an unknown value.
pub fn unknown_json() -> Value {
    Value::String(UNKNOWN_VALUE.to_string())
}
