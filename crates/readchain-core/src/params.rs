//! Stage parameters.
//!
//! Configuration for a stage arrives as an untyped key → value mapping, the
//! shape a deserialized TOML or JSON document naturally takes. [`Params`]
//! wraps that mapping and offers total accessors: a missing key and a value
//! of the wrong type both read as the type's default.
//!
//! # Example
//!
//! ```
//! use readchain_core::Params;
//! use serde_json::json;
//!
//! let params = Params::from_iter([
//!     ("algo", json!("crc32")),
//!     ("bytes", json!(1024)),
//! ]);
//!
//! assert_eq!(params.get_string("algo"), "crc32");
//! assert_eq!(params.get_int("bytes"), 1024);
//!
//! // Absent and mistyped keys read as defaults
//! assert_eq!(params.get_string("bytes"), "");
//! assert_eq!(params.get_int("missing"), 0);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// An immutable set of parameters configuring one stage.
///
/// Cloning is cheap: the underlying map is shared between the configuration
/// and every stage constructed from it.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Params {
    values: Arc<Map<String, Value>>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value of `key` as a string, or an empty string if the key
    /// is absent or the value is not a string.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Returns the value of `key` as an integer, or 0 if the key is absent or
    /// the value is not a number.
    ///
    /// Unsigned values above `i64::MAX` saturate. Floating-point values are
    /// truncated toward zero; NaN reads as 0.
    #[must_use]
    pub fn get_int(&self, key: &str) -> i64 {
        let Some(Value::Number(n)) = self.values.get(key) else {
            return 0;
        };
        if let Some(i) = n.as_i64() {
            i
        } else if n.as_u64().is_some() {
            i64::MAX
        } else {
            // `as` saturates on overflow and maps NaN to 0
            n.as_f64().map_or(0, |f| f as i64)
        }
    }

    /// Returns the value of `key` as a float, or 0.0 if the key is absent or
    /// the value is not a number.
    #[must_use]
    pub fn get_float(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Returns the value of `key` as a boolean, or `false` if the key is
    /// absent or the value is not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(Value::Bool(true)))
    }

    /// Returns true if `key` is present, whatever its type.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a copy of this set with `key` set to `value`.
    ///
    /// The receiver is left untouched; stages already holding it keep
    /// seeing the old values.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), value);
        Self::from(values)
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }
}

impl From<Params> for Map<String, Value> {
    fn from(params: Params) -> Self {
        Arc::try_unwrap(params.values).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect::<Map<String, Value>>(),
        )
    }
}
