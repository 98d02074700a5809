//! The entry store behind the `Object` kind.
//!
//! [`ValueMap`] keeps object entries in first-insertion order, and that
//! order is part of the format's contract, not a convenience: the
//! flattener visits entries in this order when it assigns slot indices,
//! so the same graph always produces the same table, and the reviver
//! re-inserts entries in row order, so a revived object iterates exactly
//! like the original did. Re-inserting an existing key replaces its value
//! but keeps its original position, which is what keeps a
//! serialize/revive/serialize chain stable.
//!
//! Iteration hands out `&str` keys; keys are owned only at the insertion
//! boundary.
//!
//! ## Examples
//!
//! ```rust
//! use revalue::{Value, ValueMap};
//!
//! let mut map = ValueMap::new();
//! map.insert("first".to_string(), Value::from(1));
//! map.insert("second".to_string(), Value::from(2));
//! map.insert("first".to_string(), Value::from(10));
//!
//! // Replacement keeps the original position.
//! let keys: Vec<&str> = map.keys().collect();
//! assert_eq!(keys, vec!["first", "second"]);
//! assert_eq!(map.get("first").and_then(Value::as_f64), Some(10.0));
//! ```

use indexmap::IndexMap;

/// Object entries in first-insertion order.
///
/// Backed by [`IndexMap`] so lookups stay constant-time while the order
/// the serializers depend on is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: IndexMap<String, crate::Value>,
}

impl ValueMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        ValueMap::default()
    }

    /// Creates an empty map sized for `capacity` entries. The reviver
    /// uses this when it knows the row's entry count up front.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts an entry. A new key goes to the end; an existing key keeps
    /// its position and the displaced value is returned.
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.entries.insert(key, value)
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.entries.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the keys in entry order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates the entries in the order the flattener will emit them and
    /// the reviver restored them.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &crate::Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}
