//! Pluggable reducers and revivers for user-defined types.
//!
//! A reducer turns a value the serializers cannot encode natively into a
//! serializable payload under a string tag; a reviver is its inverse.
//! Registries are plain per-call arguments, never process state, so two
//! concurrent serializations can use different extension sets.
//!
//! Reducers are consulted *before* native classification, in registration
//! order; the first one returning `Some` claims the value. That ordering
//! matters: a reducer may claim a plain object or even a string if it
//! wants a custom encoding for it.
//!
//! ## Examples
//!
//! ```rust
//! use revalue::{stringify_with, parse_with, Error, Reducers, Revivers, Value};
//!
//! struct Vector { x: f64, y: f64 }
//!
//! let reducers = Reducers::new().with("Vector", |v: &Value| {
//!     v.as_opaque::<Vector>()
//!         .map(|vec| Value::array(vec![Value::from(vec.x), Value::from(vec.y)]))
//! });
//!
//! let text = stringify_with(&Value::opaque(Vector { x: 30.0, y: 40.0 }), &reducers).unwrap();
//! assert_eq!(text, r#"[["Vector",1],[2,3],30,40]"#);
//!
//! let revivers = Revivers::new().with("Vector", |payload: Value| {
//!     let items = payload
//!         .as_array()
//!         .ok_or_else(|| Error::invalid_input("Vector payload must be an array"))?;
//!     let (x, y) = (items[0].as_f64().unwrap(), items[1].as_f64().unwrap());
//!     Ok(Value::opaque(Vector { x, y }))
//! });
//!
//! let revived = parse_with(&text, &revivers).unwrap();
//! let vector = revived.as_opaque::<Vector>().unwrap();
//! assert_eq!((vector.x.powi(2) + vector.y.powi(2)).sqrt(), 50.0);
//! ```

use crate::{Result, Value};
use indexmap::IndexMap;

/// Tags with a built-in meaning in the flat encoding. User tags must not
/// collide with these; the collision is reported when serialization
/// begins.
pub(crate) const BUILTIN_TAGS: &[&str] = &["BigInt", "Date", "Map", "RegExp", "Set", "null"];

/// Returns `true` if `tag` is reserved by the encoding itself.
#[must_use]
pub(crate) fn is_builtin_tag(tag: &str) -> bool {
    BUILTIN_TAGS.contains(&tag)
}

type ReduceFn<'a> = Box<dyn Fn(&Value) -> Option<Value> + 'a>;
type ReviveFn<'a> = Box<dyn Fn(Value) -> Result<Value> + 'a>;

/// An ordered registry of reducers, `tag → fn(&Value) -> Option<Value>`.
///
/// Registration order is dispatch order; the first reducer returning
/// `Some` wins.
#[derive(Default)]
pub struct Reducers<'a> {
    entries: IndexMap<String, ReduceFn<'a>>,
}

impl<'a> Reducers<'a> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Reducers::default()
    }

    /// Registers a reducer for `tag`, replacing any previous reducer with
    /// the same tag.
    #[must_use]
    pub fn with<F>(mut self, tag: impl Into<String>, reduce: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + 'a,
    {
        self.entries.insert(tag.into(), Box::new(reduce));
        self
    }

    /// Returns the number of registered reducers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no reducers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offers `value` to each reducer in registration order; returns the
    /// claiming tag and payload.
    pub(crate) fn reduce(&self, value: &Value) -> Option<(&str, Value)> {
        for (tag, reduce) in &self.entries {
            if let Some(payload) = reduce(value) {
                return Some((tag.as_str(), payload));
            }
        }
        None
    }

    /// Rejects registrations whose tag collides with a built-in tag.
    /// Called once when serialization begins.
    pub(crate) fn check_tags(&self) -> Result<()> {
        for tag in self.entries.keys() {
            if is_builtin_tag(tag) {
                return Err(crate::Error::invalid_input(format!(
                    "reducer tag {tag:?} collides with a built-in type"
                )));
            }
        }
        Ok(())
    }
}

/// An ordered registry of revivers, `tag → fn(Value) -> Result<Value>`.
#[derive(Default)]
pub struct Revivers<'a> {
    entries: IndexMap<String, ReviveFn<'a>>,
}

impl<'a> Revivers<'a> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Revivers::default()
    }

    /// Registers a reviver for `tag`, replacing any previous reviver with
    /// the same tag.
    #[must_use]
    pub fn with<F>(mut self, tag: impl Into<String>, revive: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + 'a,
    {
        self.entries.insert(tag.into(), Box::new(revive));
        self
    }

    /// Returns the number of registered revivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no revivers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, tag: &str) -> Option<&ReviveFn<'a>> {
        self.entries.get(tag)
    }
}
