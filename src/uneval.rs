//! Code-mode emission: value graph → reconstructing JavaScript expression.
//!
//! A ref-count prepass walks the graph counting distinct parents per
//! compound node. A pure tree emits as nested literals, the most compact
//! form. Shared or cyclic nodes (and sparse arrays, whose holes need
//! indexed assignment) are *hoisted*: the expression becomes an
//! immediately-invoked function whose parameters are bound to empty
//! shells (`{}`, `Array(n)`, `new Map`, `new Set`) and whose body wires
//! members in discovery order. Cycles work because every hoisted node
//! exists as a shell before any member assignment runs.
//!
//! ```rust
//! use revalue::{uneval, Value, ValueMap};
//!
//! let obj = Value::object(ValueMap::new());
//! obj.insert_entry("message", Value::from("hello"));
//! obj.insert_entry("self", obj.clone());
//!
//! assert_eq!(
//!     uneval(&obj).unwrap(),
//!     r#"(function(a){a.message="hello";a.self=a;return a}({}))"#
//! );
//! ```
//!
//! The output is an expression, not a program: embedders evaluate it with
//! an indirect eval or a `Function` body, and only when its source is
//! trusted.

use crate::escape;
use crate::path::{PathTracker, Segment};
use crate::stringify::write_number;
use crate::{Error, Result, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A code-mode replacer: offered every non-primitive value before native
/// emission. Returning `Ok(Some(expr))` claims the value with a
/// self-contained expression; `Ok(None)` means "not mine, emit natively".
/// The second argument is a recursive devaluer for nested payloads.
pub type Replacer<'a> =
    dyn Fn(&Value, &mut dyn FnMut(&Value) -> Result<String>) -> Result<Option<String>> + 'a;

/// The code-mode literal for a primitive value, or `None` for kinds that
/// need construction. Shared with the traversal-path labels for map keys.
pub(crate) fn primitive_literal(value: &Value) -> Option<String> {
    match value {
        Value::Undefined => Some("void 0".to_string()),
        Value::Null => Some("null".to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) => Some("false".to_string()),
        Value::Number(n) => Some(number_literal(*n)),
        Value::BigInt(b) => Some(format!("{b}n")),
        Value::String(s) => Some(escape::escape(s)),
        _ => None,
    }
}

fn number_literal(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == f64::INFINITY {
        return "Infinity".to_string();
    }
    if n == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }
    if n.to_bits() == (-0.0_f64).to_bits() {
        return "-0".to_string();
    }
    let mut out = String::new();
    write_number(&mut out, n);
    out
}

/// Emits `value` as a single expression, with an optional replacer.
pub(crate) fn emit(value: &Value, replacer: Option<&Replacer<'_>>) -> Result<String> {
    let mut emitter = Emitter {
        replacer,
        seen: IndexMap::new(),
        custom: HashMap::new(),
        custom_inline: HashMap::new(),
        names: HashMap::new(),
        path: PathTracker::new(),
    };
    emitter.walk(value)?;

    let hoisted: Vec<(usize, Value)> = emitter
        .seen
        .iter()
        .filter(|(_, node)| node.count > 1 || node.sparse)
        .map(|(&id, node)| (id, node.value.clone()))
        .collect();
    for (i, (id, _)) in hoisted.iter().enumerate() {
        emitter.names.insert(*id, hoisted_name(i));
    }

    let root = emitter.emit_value(value);
    if hoisted.is_empty() {
        return Ok(root);
    }

    let mut params = Vec::with_capacity(hoisted.len());
    let mut shells = Vec::with_capacity(hoisted.len());
    let mut statements = Vec::new();
    for (id, node) in &hoisted {
        let name = emitter.names[id].clone();
        if let Some(expr) = emitter.custom.get(id) {
            shells.push(expr.clone());
            params.push(name);
            continue;
        }
        match node {
            Value::Array(items) => {
                let items = items.borrow();
                shells.push(format!("Array({})", items.len()));
                for (i, item) in items.iter().enumerate() {
                    if item.is_hole() {
                        continue;
                    }
                    statements.push(format!("{name}[{i}]={}", emitter.emit_value(item)));
                }
            }
            Value::Object(map) => {
                shells.push("{}".to_string());
                for (key, item) in map.borrow().iter() {
                    let mut stmt = name.clone();
                    if escape::is_identifier(key) {
                        stmt.push('.');
                        stmt.push_str(key);
                    } else {
                        stmt.push('[');
                        escape::escape_into(&mut stmt, key);
                        stmt.push(']');
                    }
                    stmt.push('=');
                    stmt.push_str(&emitter.emit_value(item));
                    statements.push(stmt);
                }
            }
            Value::Map(pairs) => {
                shells.push("new Map".to_string());
                let pairs = pairs.borrow();
                if !pairs.is_empty() {
                    let calls: Vec<String> = pairs
                        .iter()
                        .map(|(k, v)| {
                            format!("set({},{})", emitter.emit_value(k), emitter.emit_value(v))
                        })
                        .collect();
                    statements.push(format!("{name}.{}", calls.join(".")));
                }
            }
            Value::Set(members) => {
                shells.push("new Set".to_string());
                let members = members.borrow();
                if !members.is_empty() {
                    let calls: Vec<String> = members
                        .iter()
                        .map(|m| format!("add({})", emitter.emit_value(m)))
                        .collect();
                    statements.push(format!("{name}.{}", calls.join(".")));
                }
            }
            // Only shell-capable kinds and replacer-claimed nodes are
            // ever hoisted.
            _ => unreachable!("hoisted node without a shell form"),
        }
        params.push(name);
    }
    statements.push(format!("return {root}"));

    Ok(format!(
        "(function({}){{{}}}({}))",
        params.join(","),
        statements.join(";"),
        shells.join(",")
    ))
}

/// Bijective base-26 parameter names: `a`…`z`, `aa`, `ab`, … Names that
/// collide with reserved words (`do`, `if`, `in`, …) get a trailing
/// underscore.
fn hoisted_name(mut i: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'a' + (i % 26) as u8) as char);
        i /= 26;
        if i == 0 {
            break;
        }
        i -= 1;
    }
    if !escape::is_identifier(&name) {
        name.push('_');
    }
    name
}

struct Node {
    value: Value,
    count: usize,
    sparse: bool,
}

/// Structural key for replacer claims on inline immutable kinds, which
/// have no node identity to memoize by.
#[derive(PartialEq, Eq, Hash)]
enum InlineKey {
    Date(i64),
    Regex(String, String),
}

fn inline_key(value: &Value) -> Option<InlineKey> {
    match value {
        Value::Date(d) => Some(InlineKey::Date(d.timestamp_millis())),
        Value::Regex(r) => Some(InlineKey::Regex(r.source.clone(), r.flags.clone())),
        _ => None,
    }
}

struct Emitter<'a> {
    replacer: Option<&'a Replacer<'a>>,
    /// Compound nodes in discovery order, with parent counts.
    seen: IndexMap<usize, Node>,
    /// Replacer-claimed nodes, by identity.
    custom: HashMap<usize, String>,
    /// Replacer-claimed dates and regexes, by structure.
    custom_inline: HashMap<InlineKey, String>,
    names: HashMap<usize, String>,
    path: PathTracker,
}

impl<'a> Emitter<'a> {
    fn call_replacer(&self, value: &Value) -> Result<Option<String>> {
        let Some(replacer) = self.replacer else {
            return Ok(None);
        };
        let mut devalue = |v: &Value| emit(v, Some(replacer));
        replacer(value, &mut devalue)
    }

    /// Ref-count prepass. Counts distinct parents per compound node and
    /// flags sparse arrays, which always hoist.
    fn walk(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Hole => {
                return Err(Error::unsupported("hole", self.path.render()));
            }
            Value::Undefined
            | Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::BigInt(_)
            | Value::String(_) => return Ok(()),
            // Inline immutable kinds: no children, no identity, nothing
            // to count. The replacer still gets first claim.
            Value::Date(_) | Value::Regex(_) => {
                let key = inline_key(value).expect("date/regex has an inline key");
                if !self.custom_inline.contains_key(&key) {
                    if let Some(expr) = self.call_replacer(value)? {
                        self.custom_inline.insert(key, expr);
                    }
                }
                return Ok(());
            }
            _ => {}
        }

        let id = value
            .node_id()
            .expect("compound kinds carry a node identity");
        if let Some(node) = self.seen.get_mut(&id) {
            node.count += 1;
            return Ok(());
        }
        self.seen.insert(
            id,
            Node {
                value: value.clone(),
                count: 1,
                sparse: false,
            },
        );

        if let Some(expr) = self.call_replacer(value)? {
            self.custom.insert(id, expr);
            return Ok(());
        }

        match value {
            Value::Array(items) => {
                let items = items.borrow();
                let sparse = items.iter().any(Value::is_hole);
                if sparse {
                    if let Some(node) = self.seen.get_mut(&id) {
                        node.sparse = true;
                    }
                }
                for (i, item) in items.iter().enumerate() {
                    if item.is_hole() {
                        continue;
                    }
                    self.path.push(Segment::Index(i));
                    self.walk(item)?;
                    self.path.pop();
                }
            }
            Value::Object(map) => {
                for (key, item) in map.borrow().iter() {
                    self.path.push(Segment::Key(key.to_string()));
                    self.walk(item)?;
                    self.path.pop();
                }
            }
            Value::Map(pairs) => {
                for (key, item) in pairs.borrow().iter() {
                    self.path
                        .push(Segment::MapEntry(map_key_label(key)));
                    self.walk(key)?;
                    self.walk(item)?;
                    self.path.pop();
                }
            }
            Value::Set(members) => {
                for (i, member) in members.borrow().iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    self.walk(member)?;
                    self.path.pop();
                }
            }
            Value::Opaque(_) => {
                return Err(Error::unsupported(value.kind_name(), self.path.render()));
            }
            _ => unreachable!("primitive kinds returned above"),
        }
        Ok(())
    }

    /// Emits a value expression. Hoisted nodes emit as their parameter
    /// name; everything else emits inline. Infallible: unsupported leaves
    /// were rejected by the walk.
    fn emit_value(&self, value: &Value) -> String {
        if let Some(id) = value.node_id() {
            if let Some(name) = self.names.get(&id) {
                return name.clone();
            }
            if let Some(expr) = self.custom.get(&id) {
                return expr.clone();
            }
        }
        if let Some(literal) = primitive_literal(value) {
            return literal;
        }
        if let Some(key) = inline_key(value) {
            if let Some(expr) = self.custom_inline.get(&key) {
                return expr.clone();
            }
        }
        match value {
            Value::Date(d) => format!("new Date({})", d.timestamp_millis()),
            Value::Regex(r) => {
                if r.flags.is_empty() {
                    format!("new RegExp({})", escape::escape(&r.source))
                } else {
                    format!(
                        "new RegExp({},{})",
                        escape::escape(&r.source),
                        escape::escape(&r.flags)
                    )
                }
            }
            Value::Array(items) => {
                let members: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|item| self.emit_value(item))
                    .collect();
                format!("[{}]", members.join(","))
            }
            Value::Object(map) => {
                let map = map.borrow();
                let mut out = String::from("{");
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    escape::key_into(&mut out, key);
                    out.push(':');
                    out.push_str(&self.emit_value(item));
                }
                out.push('}');
                out
            }
            Value::Map(pairs) => {
                let pairs = pairs.borrow();
                if pairs.is_empty() {
                    return "new Map".to_string();
                }
                let entries: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("[{},{}]", self.emit_value(k), self.emit_value(v)))
                    .collect();
                format!("new Map([{}])", entries.join(","))
            }
            Value::Set(members) => {
                let members = members.borrow();
                if members.is_empty() {
                    return "new Set".to_string();
                }
                let items: Vec<String> = members.iter().map(|m| self.emit_value(m)).collect();
                format!("new Set([{}])", items.join(","))
            }
            // Primitives were handled by `primitive_literal`; holes and
            // unclaimed opaques were rejected by the walk.
            _ => unreachable!("unsupported kinds rejected during the prepass"),
        }
    }
}

/// The `.get(K)` label used in map-entry traversal paths: the code-mode
/// literal for primitive keys, an ellipsis for compound keys.
pub(crate) fn map_key_label(key: &Value) -> String {
    primitive_literal(key).unwrap_or_else(|| "(...)".to_string())
}
