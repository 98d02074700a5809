//! Graph-to-flat-table traversal.
//!
//! The flattener walks a value graph and produces the ordered slot table
//! that data mode serializes: every distinct value gets one dense index
//! (by node identity for compound values, by structural equality for
//! primitives), and referrers cite indices instead of embedding values,
//! which is what makes sharing and cycles representable in plain JSON.
//!
//! The cycle-breaker is reservation before descent: a value's index is
//! recorded in the identity map *before* its children are visited, so a
//! back edge discovered mid-descent resolves to the already-reserved
//! index instead of recursing forever.
//!
//! Sentinel primitives (`undefined`, `NaN`, `±Inf`, `-0`) never occupy
//! slots; they are encoded in-band as reserved negative codes wherever a
//! referrer would appear.

use crate::path::{PathTracker, Segment};
use crate::registry::Reducers;
use crate::{Error, Result, Value};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::collections::HashMap;

/// Absent array element. Valid only inside [`Slot::Array`] rows.
pub(crate) const HOLE: i64 = -1;
/// The `undefined` primitive.
pub(crate) const UNDEFINED: i64 = -2;
pub(crate) const POSITIVE_INFINITY: i64 = -3;
pub(crate) const NEGATIVE_INFINITY: i64 = -4;
pub(crate) const NAN: i64 = -5;
pub(crate) const NEGATIVE_ZERO: i64 = -6;

/// A referrer: a non-negative slot index, or one of the sentinel codes.
pub(crate) type Ref = i64;

/// One slot of the flat table, in typed form. Each variant corresponds to
/// one JSON row shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    /// Finite, non-negative-zero number.
    Number(f64),
    Bool(bool),
    Null,
    String(String),
    BigInt(BigInt),
    Date(DateTime<Utc>),
    Regex { source: String, flags: String },
    Object(Vec<(String, Ref)>),
    Array(Vec<Ref>),
    Map(Vec<(Ref, Ref)>),
    Set(Vec<Ref>),
    Custom { tag: String, payload: Ref },
}

/// The flattened form of a graph: the root referrer and the slot table.
/// A sentinel-primitive root has an empty table and a negative root.
#[derive(Debug)]
pub(crate) struct FlatTable {
    pub(crate) root: Ref,
    pub(crate) slots: Vec<Slot>,
}

/// Flattens `root` into a table, consulting `reducers` before native
/// classification.
pub(crate) fn flatten(root: &Value, reducers: &Reducers<'_>) -> Result<FlatTable> {
    reducers.check_tags()?;
    let mut flattener = Flattener {
        reducers,
        slots: Vec::new(),
        identity: HashMap::new(),
        primitives: HashMap::new(),
        path: PathTracker::new(),
    };
    let root = flattener.visit(root)?;
    let slots = flattener
        .slots
        .into_iter()
        .map(|slot| slot.expect("every reserved slot is assigned before flatten returns"))
        .collect();
    Ok(FlatTable { root, slots })
}

/// Structural identity for primitive-like values. Numbers key on their
/// bit pattern, so `-0` and `NaN` payloads (which never reach here) and
/// distinct-but-equal doubles behave per invariant.
#[derive(PartialEq, Eq, Hash)]
enum PrimKey {
    Null,
    Bool(bool),
    Number(u64),
    String(String),
    BigInt(BigInt),
    Date(i64),
    Regex(String, String),
}

fn prim_key(value: &Value) -> Option<PrimKey> {
    match value {
        Value::Null => Some(PrimKey::Null),
        Value::Bool(b) => Some(PrimKey::Bool(*b)),
        Value::Number(n) => Some(PrimKey::Number(n.to_bits())),
        Value::String(s) => Some(PrimKey::String(s.clone())),
        Value::BigInt(b) => Some(PrimKey::BigInt(b.clone())),
        Value::Date(d) => Some(PrimKey::Date(d.timestamp_millis())),
        Value::Regex(r) => Some(PrimKey::Regex(r.source.clone(), r.flags.clone())),
        _ => None,
    }
}

struct Flattener<'a, 'r> {
    reducers: &'a Reducers<'r>,
    slots: Vec<Option<Slot>>,
    identity: HashMap<usize, usize>,
    primitives: HashMap<PrimKey, usize>,
    path: PathTracker,
}

impl<'a, 'r> Flattener<'a, 'r> {
    fn visit(&mut self, value: &Value) -> Result<Ref> {
        match value {
            Value::Undefined => return Ok(UNDEFINED),
            Value::Hole => {
                // Holes are encoded by the array loop; reaching one here
                // means it sat outside an array.
                return Err(Error::unsupported("hole", self.path.render()));
            }
            Value::Number(n) => {
                if n.is_nan() {
                    return Ok(NAN);
                }
                if *n == f64::INFINITY {
                    return Ok(POSITIVE_INFINITY);
                }
                if *n == f64::NEG_INFINITY {
                    return Ok(NEGATIVE_INFINITY);
                }
                if n.to_bits() == (-0.0_f64).to_bits() {
                    return Ok(NEGATIVE_ZERO);
                }
            }
            _ => {}
        }

        if let Some(id) = value.node_id() {
            if let Some(&index) = self.identity.get(&id) {
                return Ok(index as Ref);
            }
        } else if let Some(key) = prim_key(value) {
            if let Some(&index) = self.primitives.get(&key) {
                return Ok(index as Ref);
            }
        }

        // Reserve before descent; back edges resolve to this index.
        let index = self.slots.len();
        self.slots.push(None);
        if let Some(id) = value.node_id() {
            self.identity.insert(id, index);
        } else if let Some(key) = prim_key(value) {
            self.primitives.insert(key, index);
        }

        let reducers = self.reducers;
        if let Some((tag, payload)) = reducers.reduce(value) {
            let payload = self.visit(&payload)?;
            self.slots[index] = Some(Slot::Custom {
                tag: tag.to_string(),
                payload,
            });
            return Ok(index as Ref);
        }

        let slot = match value {
            Value::Null => Slot::Null,
            Value::Bool(b) => Slot::Bool(*b),
            Value::Number(n) => Slot::Number(*n),
            Value::String(s) => Slot::String(s.clone()),
            Value::BigInt(b) => Slot::BigInt(b.clone()),
            Value::Date(d) => Slot::Date(*d),
            Value::Regex(r) => Slot::Regex {
                source: r.source.clone(),
                flags: r.flags.clone(),
            },
            Value::Array(items) => {
                let items = items.borrow();
                let mut refs = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if item.is_hole() {
                        refs.push(HOLE);
                        continue;
                    }
                    self.path.push(Segment::Index(i));
                    refs.push(self.visit(item)?);
                    self.path.pop();
                }
                Slot::Array(refs)
            }
            Value::Object(map) => {
                let map = map.borrow();
                let mut entries = Vec::with_capacity(map.len());
                for (key, item) in map.iter() {
                    self.path.push(Segment::Key(key.to_string()));
                    entries.push((key.to_string(), self.visit(item)?));
                    self.path.pop();
                }
                Slot::Object(entries)
            }
            Value::Map(pairs) => {
                let pairs = pairs.borrow();
                let mut entries = Vec::with_capacity(pairs.len());
                for (key, item) in pairs.iter() {
                    self.path
                        .push(Segment::MapEntry(crate::uneval::map_key_label(key)));
                    let key_ref = self.visit(key)?;
                    let value_ref = self.visit(item)?;
                    entries.push((key_ref, value_ref));
                    self.path.pop();
                }
                Slot::Map(entries)
            }
            Value::Set(members) => {
                let members = members.borrow();
                let mut refs = Vec::with_capacity(members.len());
                for (i, member) in members.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    refs.push(self.visit(member)?);
                    self.path.pop();
                }
                Slot::Set(refs)
            }
            Value::Opaque(_) => {
                return Err(Error::unsupported(value.kind_name(), self.path.render()));
            }
            Value::Undefined | Value::Hole => unreachable!("returned above"),
        };
        self.slots[index] = Some(slot);
        Ok(index as Ref)
    }
}
