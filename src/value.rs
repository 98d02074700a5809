//! Dynamic value graphs.
//!
//! This module provides the [`Value`] enum, which represents any value the
//! serializers handle: JSON-style primitives, sentinel numerics, big
//! integers, timestamps, regular expressions, ordered collections, and
//! opaque user types awaiting a reducer.
//!
//! ## Sharing and cycles
//!
//! Compound kinds ([`Value::Array`], [`Value::Object`], [`Value::Map`],
//! [`Value::Set`], [`Value::Opaque`]) are reference-counted handles:
//! cloning a `Value` clones the handle, not the contents. Two clones of
//! the same handle are *the same node*, and the serializers preserve that
//! distinction: a node reachable twice is emitted once and cited twice,
//! and a node that reaches itself round-trips as a true cycle.
//!
//! ```rust
//! use revalue::Value;
//!
//! let shared = Value::array(vec![Value::from(1)]);
//! let outer = Value::array(vec![shared.clone(), shared.clone()]);
//!
//! // Both elements are the same node:
//! let items = outer.as_array().unwrap();
//! assert!(items[0].same_node(&items[1]));
//! ```
//!
//! ## Building cyclic graphs
//!
//! Compound contents sit behind `RefCell`, so a node can be wired to
//! itself after construction:
//!
//! ```rust
//! use revalue::{Value, ValueMap};
//!
//! let obj = Value::object(ValueMap::new());
//! obj.insert_entry("self", obj.clone());
//! let entries = obj.as_object().unwrap();
//! assert!(entries.get("self").unwrap().same_node(&obj));
//! ```
//!
//! ## Equality
//!
//! `PartialEq` is kind-preserving structural equality with the numeric
//! semantics the round-trip guarantee needs: numbers compare bitwise
//! (`NaN == NaN`, `-0.0 != 0.0`), and cyclic graphs compare by unfolding
//! coinductively, so `a == b` terminates even when both sides are cyclic.
//! Opaque values compare by handle identity.

use crate::ValueMap;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Largest magnitude at which every integer is exactly representable as an
/// IEEE-754 double (2^53).
pub(crate) const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// A regular expression value: source pattern plus flags, both verbatim.
///
/// The pattern is not compiled or validated; this crate transports regular
/// expressions, the embedder executes them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Regex {
    pub source: String,
    pub flags: String,
}

impl Regex {
    /// Creates a regex value from a source pattern and flags.
    #[must_use]
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Regex {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

/// A type-erased user value, serializable only through a registered
/// reducer.
pub struct OpaqueValue {
    type_name: &'static str,
    value: Box<dyn Any>,
}

impl OpaqueValue {
    /// The Rust type name captured when the value was wrapped. Used in
    /// [`UnsupportedValue`](crate::Error::UnsupportedValue) reports.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// The kind of a [`Value`], as reported by [`Value::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Hole,
    Null,
    Bool,
    Number,
    BigInt,
    String,
    Date,
    Regex,
    Array,
    Object,
    Map,
    Set,
    Opaque,
}

impl Kind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::Undefined => "undefined",
            Kind::Hole => "hole",
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::BigInt => "bigint",
            Kind::String => "string",
            Kind::Date => "date",
            Kind::Regex => "regex",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Map => "map",
            Kind::Set => "set",
            Kind::Opaque => "opaque",
        }
    }
}

/// A dynamically-typed value graph node.
///
/// See the [module docs](self) for the sharing and equality semantics.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent-value primitive (`undefined`).
    Undefined,
    /// An array hole. Only meaningful as an element of [`Value::Array`];
    /// anywhere else it fails serialization.
    Hole,
    #[default]
    Null,
    Bool(bool),
    /// An IEEE-754 double. The sentinels `NaN`, `±Inf` and `-0.0` are
    /// preserved exactly; `-0.0` is distinguished by bit inspection.
    Number(f64),
    BigInt(BigInt),
    String(String),
    /// An instant with millisecond precision.
    Date(DateTime<Utc>),
    Regex(Regex),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<ValueMap>>),
    /// Ordered key/value pairs; keys are arbitrary values.
    Map(Rc<RefCell<Vec<(Value, Value)>>>),
    /// Ordered members; distinctness is the builder's contract.
    Set(Rc<RefCell<Vec<Value>>>),
    /// A user value with no native encoding. Serialization fails with
    /// `UnsupportedValue` unless a reducer claims it.
    Opaque(Rc<OpaqueValue>),
}

impl Value {
    /// Creates an array node from its elements. Use [`Value::Hole`] for
    /// absent positions.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Creates an object node from an ordered map.
    #[must_use]
    pub fn object(map: ValueMap) -> Value {
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// Creates a map node from ordered key/value pairs.
    #[must_use]
    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Creates a set node from ordered members.
    ///
    /// Members are stored as given; callers keep them distinct.
    #[must_use]
    pub fn set(members: Vec<Value>) -> Value {
        Value::Set(Rc::new(RefCell::new(members)))
    }

    /// Creates a regex value from a source pattern and flags.
    #[must_use]
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Value {
        Value::Regex(Regex::new(source, flags))
    }

    /// Creates a date value from a millisecond Unix timestamp.
    ///
    /// Returns `None` when the timestamp is outside the representable
    /// range.
    #[must_use]
    pub fn date_ms(millis: i64) -> Option<Value> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(Value::Date)
    }

    /// Wraps a user value as an opaque node.
    ///
    /// This is the class-instance side of the plain-record boundary: a
    /// `Value::Object` is always a plain record, while an opaque node is
    /// only serializable through a reducer registered for its type. The
    /// Rust type name is captured for error reporting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use revalue::Value;
    ///
    /// struct Vector { x: f64, y: f64 }
    ///
    /// let v = Value::opaque(Vector { x: 30.0, y: 40.0 });
    /// assert!(v.as_opaque::<Vector>().is_some());
    /// assert!(v.as_opaque::<String>().is_none());
    /// ```
    #[must_use]
    pub fn opaque<T: Any>(value: T) -> Value {
        Value::Opaque(Rc::new(OpaqueValue {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }))
    }

    /// Borrows the wrapped user value if this is an opaque node of type
    /// `T`.
    #[must_use]
    pub fn as_opaque<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(o) => o.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Classifies this value. Stable across calls: classification never
    /// depends on traversal state.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Hole => Kind::Hole,
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::BigInt(_) => Kind::BigInt,
            Value::String(_) => Kind::String,
            Value::Date(_) => Kind::Date,
            Value::Regex(_) => Kind::Regex,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Map(_) => Kind::Map,
            Value::Set(_) => Kind::Set,
            Value::Opaque(_) => Kind::Opaque,
        }
    }

    /// The kind name used in error reports. Opaque values name the
    /// wrapped Rust type.
    #[must_use]
    pub fn kind_name(&self) -> String {
        match self {
            Value::Opaque(o) => format!("opaque {}", o.type_name()),
            other => other.kind().as_str().to_string(),
        }
    }

    /// Returns `true` if the value is `undefined`.
    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` if the value is an array hole.
    #[inline]
    #[must_use]
    pub const fn is_hole(&self) -> bool {
        matches!(self, Value::Hole)
    }

    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is a boolean.
    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if the value is an array node.
    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns `true` if the value is an object node.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// If the value is a boolean, returns it.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a number, returns it.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is a big integer, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(b) => Some(b),
            _ => None,
        }
    }

    /// If the value is a date, returns it.
    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// If the value is a regex, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Value::Regex(r) => Some(r),
            _ => None,
        }
    }

    /// If the value is an array node, borrows its elements.
    #[must_use]
    pub fn as_array(&self) -> Option<Ref<'_, Vec<Value>>> {
        match self {
            Value::Array(a) => Some(a.borrow()),
            _ => None,
        }
    }

    /// If the value is an object node, borrows its entries.
    #[must_use]
    pub fn as_object(&self) -> Option<Ref<'_, ValueMap>> {
        match self {
            Value::Object(o) => Some(o.borrow()),
            _ => None,
        }
    }

    /// If the value is a map node, borrows its entry list.
    #[must_use]
    pub fn as_map(&self) -> Option<Ref<'_, Vec<(Value, Value)>>> {
        match self {
            Value::Map(m) => Some(m.borrow()),
            _ => None,
        }
    }

    /// If the value is a set node, borrows its members.
    #[must_use]
    pub fn as_set(&self) -> Option<Ref<'_, Vec<Value>>> {
        match self {
            Value::Set(s) => Some(s.borrow()),
            _ => None,
        }
    }

    /// Inserts an entry into an object node. No-op on other kinds.
    ///
    /// Convenience for wiring graphs (including cycles) after
    /// construction.
    pub fn insert_entry(&self, key: impl Into<String>, value: Value) {
        if let Value::Object(o) = self {
            o.borrow_mut().insert(key.into(), value);
        }
    }

    /// Appends an element to an array node. No-op on other kinds.
    pub fn push_element(&self, value: Value) {
        if let Value::Array(a) = self {
            a.borrow_mut().push(value);
        }
    }

    /// Returns `true` if `self` and `other` are the same compound node
    /// (handle identity). Always `false` for non-compound kinds.
    #[must_use]
    pub fn same_node(&self, other: &Value) -> bool {
        match (self.node_id(), other.node_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Identity of a compound node, as a stable address while the node is
    /// alive. `None` for inline kinds. The flattener keys its identity
    /// map on this.
    #[must_use]
    pub(crate) fn node_id(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Rc::as_ptr(a) as *const u8 as usize),
            Value::Object(o) => Some(Rc::as_ptr(o) as *const u8 as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as *const u8 as usize),
            Value::Set(s) => Some(Rc::as_ptr(s) as *const u8 as usize),
            Value::Opaque(o) => Some(Rc::as_ptr(o) as *const u8 as usize),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut visiting = HashSet::new();
        eq_graph(self, other, &mut visiting)
    }
}

/// Coinductive structural equality: a pair of nodes already under
/// comparison is assumed equal, which terminates cyclic comparisons and
/// gives the right answer for graphs that unfold identically.
fn eq_graph(a: &Value, b: &Value, visiting: &mut HashSet<(usize, usize)>) -> bool {
    let pair = match (a.node_id(), b.node_id()) {
        (Some(x), Some(y)) => {
            if x == y {
                return a.kind() == b.kind();
            }
            Some((x, y))
        }
        _ => None,
    };
    if let Some(pair) = pair {
        if !visiting.insert(pair) {
            return true;
        }
    }
    match (a, b) {
        (Value::Undefined, Value::Undefined)
        | (Value::Hole, Value::Hole)
        | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x.to_bits() == y.to_bits(),
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x.timestamp_millis() == y.timestamp_millis(),
        (Value::Regex(x), Value::Regex(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| eq_graph(a, b, visiting))
        }
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|((ka, va), (kb, vb))| {
                    ka == kb && eq_graph(va, vb, visiting)
                })
        }
        (Value::Map(x), Value::Map(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|((ka, va), (kb, vb))| {
                    eq_graph(ka, kb, visiting) && eq_graph(va, vb, visiting)
                })
        }
        (Value::Set(x), Value::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| eq_graph(a, b, visiting))
        }
        (Value::Opaque(x), Value::Opaque(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open = HashSet::new();
        debug_graph(self, f, &mut open)
    }
}

/// Debug rendering with a revisit guard so cyclic graphs print instead of
/// overflowing the stack.
fn debug_graph(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    open: &mut HashSet<usize>,
) -> fmt::Result {
    if let Some(id) = value.node_id() {
        if !open.insert(id) {
            return write!(f, "<node {:#x}>", id);
        }
    }
    let result = match value {
        Value::Undefined => write!(f, "Undefined"),
        Value::Hole => write!(f, "Hole"),
        Value::Null => write!(f, "Null"),
        Value::Bool(b) => write!(f, "Bool({b})"),
        Value::Number(n) => write!(f, "Number({n:?})"),
        Value::BigInt(b) => write!(f, "BigInt({b})"),
        Value::String(s) => write!(f, "String({s:?})"),
        Value::Date(d) => write!(f, "Date({d:?})"),
        Value::Regex(r) => write!(f, "Regex(/{}/{})", r.source, r.flags),
        Value::Array(a) => {
            write!(f, "Array[")?;
            for (i, item) in a.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                debug_graph(item, f, open)?;
            }
            write!(f, "]")
        }
        Value::Object(o) => {
            write!(f, "Object{{")?;
            for (i, (key, item)) in o.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key:?}: ")?;
                debug_graph(item, f, open)?;
            }
            write!(f, "}}")
        }
        Value::Map(m) => {
            write!(f, "Map{{")?;
            for (i, (key, item)) in m.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                debug_graph(key, f, open)?;
                write!(f, " => ")?;
                debug_graph(item, f, open)?;
            }
            write!(f, "}}")
        }
        Value::Set(s) => {
            write!(f, "Set{{")?;
            for (i, item) in s.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                debug_graph(item, f, open)?;
            }
            write!(f, "}}")
        }
        Value::Opaque(o) => write!(f, "Opaque({})", o.type_name()),
    };
    if let Some(id) = value.node_id() {
        open.remove(&id);
    }
    result
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    /// Integers beyond the double-safe range become [`Value::BigInt`] so
    /// no precision is lost.
    fn from(value: i64) -> Self {
        if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value) {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        if value <= MAX_SAFE_INTEGER as u64 {
            Value::Number(value as f64)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Regex> for Value {
    fn from(value: Regex) -> Self {
        Value::Regex(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::object(value)
    }
}
