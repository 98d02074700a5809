//! # revalue
//!
//! Serialization for value *graphs*, not just trees, into compact
//! textual forms that restore faithfully.
//!
//! ## Why not plain JSON?
//!
//! `JSON.stringify`-style encoders lose everything interesting about a
//! graph: cyclic references throw, repeated references duplicate, `NaN`,
//! `±Infinity` and `-0` collapse, `undefined` disappears, and big
//! integers, dates, regular expressions, maps and sets have no
//! representation at all. This crate handles all of them, plus
//! user-defined opaque types through pluggable reducers/revivers.
//!
//! ## Two output modes
//!
//! - **Data mode**: [`stringify`] emits a pure JSON document, a flat
//!   indexed table where compound values cite each other by slot index.
//!   [`parse`] and [`unflatten`] rebuild the graph, cycles included.
//! - **Code mode**: [`uneval`] emits a single JavaScript expression
//!   whose evaluation reconstructs the graph, hoisting shared and cyclic
//!   nodes into an immediately-invoked function.
//!
//! Both outputs are safe to embed inside an HTML `<script>` element: no
//! `</script`, no `<!--`, no raw U+2028/U+2029. (Safe to *embed*
//! is not safe to *trust*: only evaluate code-mode output whose source
//! you control.)
//!
//! ## Quick start
//!
//! ```rust
//! use revalue::{parse, stringify, value};
//!
//! let graph = value!({ "message": "hello" });
//! let text = stringify(&graph).unwrap();
//! assert_eq!(text, r#"[{"message":1},"hello"]"#);
//!
//! let back = parse(&text).unwrap();
//! assert_eq!(back, graph);
//! ```
//!
//! Sharing and cycles survive the round trip:
//!
//! ```rust
//! use revalue::{parse, stringify, Value, ValueMap};
//!
//! let obj = Value::object(ValueMap::new());
//! obj.insert_entry("message", Value::from("hello"));
//! obj.insert_entry("self", obj.clone());
//!
//! let text = stringify(&obj).unwrap();
//! assert_eq!(text, r#"[{"message":1,"self":0},"hello"]"#);
//!
//! let back = parse(&text).unwrap();
//! let entries = back.as_object().unwrap();
//! assert!(entries.get("self").unwrap().same_node(&back));
//! ```
//!
//! ## Custom types
//!
//! Reducers turn opaque values into tagged payloads; revivers invert
//! them. Registries are per-call arguments, never global state:
//!
//! ```rust
//! use revalue::{parse_with, stringify_with, Error, Reducers, Revivers, Value};
//!
//! struct Vector { x: f64, y: f64 }
//!
//! let reducers = Reducers::new().with("Vector", |v: &Value| {
//!     v.as_opaque::<Vector>()
//!         .map(|vec| Value::array(vec![Value::from(vec.x), Value::from(vec.y)]))
//! });
//! let revivers = Revivers::new().with("Vector", |payload: Value| {
//!     let items = payload
//!         .as_array()
//!         .ok_or_else(|| Error::invalid_input("Vector payload must be an array"))?;
//!     let (x, y) = (items[0].as_f64().unwrap(), items[1].as_f64().unwrap());
//!     Ok(Value::opaque(Vector { x, y }))
//! });
//!
//! let text = stringify_with(&Value::opaque(Vector { x: 30.0, y: 40.0 }), &reducers).unwrap();
//! assert_eq!(text, r#"[["Vector",1],[2,3],30,40]"#);
//! let back = parse_with(&text, &revivers).unwrap();
//! assert!(back.as_opaque::<Vector>().is_some());
//! ```
//!
//! ## Format
//!
//! The wire encoding is documented in the [`format`](mod@crate::format)
//! module.

pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod registry;
pub mod value;

mod escape;
mod flatten;
mod parse;
mod path;
mod stringify;
mod uneval;

pub use error::{Error, Result};
pub use map::ValueMap;
pub use registry::{Reducers, Revivers};
pub use uneval::Replacer;
pub use value::{Kind, OpaqueValue, Regex, Value};

/// Serializes a value graph to a JSON document (data mode).
///
/// The output is a flat slot table (or a bare sentinel code for sentinel
/// primitive roots); see [`format`](mod@crate::format) for the encoding.
/// Use [`stringify_with`] to serialize opaque user types.
///
/// # Examples
///
/// ```rust
/// use revalue::{stringify, value, Value};
///
/// assert_eq!(stringify(&value!({"message": "hello"})).unwrap(), r#"[{"message":1},"hello"]"#);
/// assert_eq!(stringify(&Value::from(f64::NAN)).unwrap(), "-5");
/// assert_eq!(stringify(&Value::Undefined).unwrap(), "-2");
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] when the graph contains an opaque
/// value (no reducer is consulted here) or a hole outside an array; the
/// error names the leaf by its traversal path.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify(value: &Value) -> Result<String> {
    stringify_with(value, &Reducers::new())
}

/// Serializes a value graph to a JSON document, consulting `reducers`
/// before native classification.
///
/// Reducers run in registration order and the first one returning `Some`
/// claims the value; its payload is serialized in its place under the
/// reducer's tag.
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for unclaimed opaque values and
/// misplaced holes, and [`Error::InvalidInput`] when a reducer tag
/// collides with a built-in tag.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify_with(value: &Value, reducers: &Reducers<'_>) -> Result<String> {
    let table = flatten::flatten(value, reducers)?;
    Ok(stringify::render(&table))
}

/// Serializes a value graph to a JavaScript expression (code mode).
///
/// Evaluating the expression (with indirect `eval`, in a context that
/// trusts it) reconstructs the graph, sharing and cycles included.
///
/// # Examples
///
/// ```rust
/// use revalue::{uneval, value};
///
/// assert_eq!(uneval(&value!({})).unwrap(), "{}");
/// assert_eq!(uneval(&value!({"a": 1})).unwrap(), "{a:1}");
/// assert_eq!(uneval(&value!([1, "two"])).unwrap(), r#"[1,"two"]"#);
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for opaque values (use
/// [`uneval_with`] and a replacer) and holes outside arrays.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn uneval(value: &Value) -> Result<String> {
    uneval::emit(value, None)
}

/// Serializes a value graph to a JavaScript expression, offering every
/// non-primitive value to `replacer` first.
///
/// The replacer receives the value and a recursive devaluer for nested
/// payloads; returning `Ok(None)` falls through to native emission.
///
/// # Examples
///
/// ```rust
/// use revalue::{uneval_with, Value};
///
/// struct Vector { x: f64, y: f64 }
///
/// let code = uneval_with(
///     &Value::opaque(Vector { x: 3.0, y: 4.0 }),
///     &|value, _devalue| {
///         Ok(value
///             .as_opaque::<Vector>()
///             .map(|vec| format!("new Vector({},{})", vec.x, vec.y)))
///     },
/// )
/// .unwrap();
/// assert_eq!(code, "new Vector(3,4)");
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for opaque values the replacer
/// declines, and any error the replacer itself returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn uneval_with(value: &Value, replacer: &Replacer<'_>) -> Result<String> {
    uneval::emit(value, Some(replacer))
}

/// Revives a value graph from data-mode text. Inverse of [`stringify`].
///
/// # Examples
///
/// ```rust
/// use revalue::{parse, value};
///
/// let back = parse(r#"[{"message":1},"hello"]"#).unwrap();
/// assert_eq!(back, value!({"message": "hello"}));
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for malformed JSON or a malformed
/// table, and [`Error::UnknownType`] for a custom tag with no reviver
/// (use [`parse_with`]).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(text: &str) -> Result<Value> {
    parse_with(text, &Revivers::new())
}

/// Revives a value graph from data-mode text, using `revivers` for
/// custom tags.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`], [`Error::UnknownType`], or
/// [`Error::CycleInPrimitiveForm`], plus any error a reviver returns.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with(text: &str, revivers: &Revivers<'_>) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    parse::revive(&json, revivers)
}

/// Revives a value graph from already-parsed JSON.
///
/// Use this when the flat table is embedded inside a larger JSON
/// document and has already been decoded.
///
/// # Examples
///
/// ```rust
/// use revalue::{unflatten, value};
///
/// let document: serde_json::Value =
///     serde_json::from_str(r#"{"state":[{"count":1},42]}"#).unwrap();
/// let back = unflatten(&document["state"]).unwrap();
/// assert_eq!(back, value!({"count": 42}));
/// ```
///
/// # Errors
///
/// Same as [`parse`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn unflatten(json: &serde_json::Value) -> Result<Value> {
    parse::revive(json, &Revivers::new())
}

/// Revives a value graph from already-parsed JSON, using `revivers` for
/// custom tags.
///
/// # Errors
///
/// Same as [`parse_with`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn unflatten_with(json: &serde_json::Value, revivers: &Revivers<'_>) -> Result<Value> {
    parse::revive(json, revivers)
}
