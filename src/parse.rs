//! Revival: flat JSON table → value graph.
//!
//! Revival runs in two stages. First every row is validated into a typed
//! [`Slot`]: shapes are checked, indices are range-checked, and sentinel
//! codes are only accepted where the encoding allows them, so a malformed
//! table is rejected before any value is built. Then the root slot is
//! hydrated: compound rows materialize as empty shells that are recorded
//! *before* their children are resolved, so back references (including
//! the slot's own index) find the shell and cycles reconstruct exactly.
//!
//! Rows without a shell form (tagged primitives and custom payloads)
//! cannot participate in a cycle; re-entering one mid-hydration is
//! reported as [`CycleInPrimitiveForm`](crate::Error::CycleInPrimitiveForm).

use crate::flatten::{
    Ref, Slot, HOLE, NAN, NEGATIVE_INFINITY, NEGATIVE_ZERO, POSITIVE_INFINITY, UNDEFINED,
};
use crate::registry::Revivers;
use crate::{Error, Result, Value, ValueMap};
use num_bigint::BigInt;
use serde_json::Value as Json;

/// Revives a graph from already-parsed JSON.
pub(crate) fn revive(json: &Json, revivers: &Revivers<'_>) -> Result<Value> {
    match json {
        // Bare primitive roots. Numbers must be sentinel codes: a bare
        // index would be ambiguous with a plain integer.
        Json::Number(n) => {
            let code = n
                .as_i64()
                .and_then(sentinel_value)
                .ok_or_else(|| Error::invalid_input("bare number root is not a sentinel code"))?;
            Ok(code)
        }
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Null => Ok(Value::Null),
        Json::Array(rows) => {
            if rows.is_empty() {
                return Err(Error::invalid_input("flat table has no slots"));
            }
            let slots = decode_rows(rows)?;
            let mut reviver = Reviver {
                slots: &slots,
                states: vec![State::Empty; slots.len()],
                revivers,
            };
            reviver.hydrate(0)
        }
        Json::Object(_) => Err(Error::invalid_input(
            "top level must be a flat table array or a bare primitive",
        )),
    }
}

fn sentinel_value(code: i64) -> Option<Value> {
    match code {
        UNDEFINED => Some(Value::Undefined),
        POSITIVE_INFINITY => Some(Value::Number(f64::INFINITY)),
        NEGATIVE_INFINITY => Some(Value::Number(f64::NEG_INFINITY)),
        NAN => Some(Value::Number(f64::NAN)),
        NEGATIVE_ZERO => Some(Value::Number(-0.0)),
        _ => None,
    }
}

/// Validates every row up front, so malformed rows are rejected even when
/// nothing references them.
fn decode_rows(rows: &[Json]) -> Result<Vec<Slot>> {
    let len = rows.len();
    rows.iter()
        .enumerate()
        .map(|(index, row)| decode_row(index, row, len))
        .collect()
}

fn decode_row(index: usize, row: &Json, len: usize) -> Result<Slot> {
    match row {
        Json::Null => Ok(Slot::Null),
        Json::Bool(b) => Ok(Slot::Bool(*b)),
        Json::Number(n) => {
            let value = n
                .as_f64()
                .ok_or_else(|| Error::invalid_input(format!("slot {index}: unreadable number")))?;
            Ok(Slot::Number(value))
        }
        Json::String(s) => Ok(Slot::String(s.clone())),
        Json::Object(entries) => {
            let entries = entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), decode_ref(index, value, len, false)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Slot::Object(entries))
        }
        Json::Array(items) => match items.first() {
            Some(Json::String(tag)) => decode_tagged(index, tag, &items[1..], len),
            _ => {
                let refs = items
                    .iter()
                    .map(|item| decode_ref(index, item, len, true))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Slot::Array(refs))
            }
        },
    }
}

fn decode_tagged(index: usize, tag: &str, rest: &[Json], len: usize) -> Result<Slot> {
    match tag {
        "Date" => match rest {
            [Json::String(iso)] => {
                let instant = chrono::DateTime::parse_from_rfc3339(iso).map_err(|err| {
                    Error::invalid_input(format!("slot {index}: bad Date payload: {err}"))
                })?;
                Ok(Slot::Date(instant.with_timezone(&chrono::Utc)))
            }
            _ => Err(Error::invalid_input(format!(
                "slot {index}: Date row needs a single ISO-8601 string"
            ))),
        },
        "RegExp" => match rest {
            [Json::String(source)] => Ok(Slot::Regex {
                source: source.clone(),
                flags: String::new(),
            }),
            [Json::String(source), Json::String(flags)] => Ok(Slot::Regex {
                source: source.clone(),
                flags: flags.clone(),
            }),
            _ => Err(Error::invalid_input(format!(
                "slot {index}: RegExp row needs a source and optional flags"
            ))),
        },
        "BigInt" => match rest {
            [Json::String(digits)] => {
                let value = digits.parse::<BigInt>().map_err(|_| {
                    Error::invalid_input(format!("slot {index}: bad BigInt digits {digits:?}"))
                })?;
                Ok(Slot::BigInt(value))
            }
            _ => Err(Error::invalid_input(format!(
                "slot {index}: BigInt row needs a single digit string"
            ))),
        },
        "Map" => {
            if rest.len() % 2 != 0 {
                return Err(Error::invalid_input(format!(
                    "slot {index}: Map row needs key/value index pairs"
                )));
            }
            let entries = rest
                .chunks_exact(2)
                .map(|pair| {
                    Ok((
                        decode_ref(index, &pair[0], len, false)?,
                        decode_ref(index, &pair[1], len, false)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Slot::Map(entries))
        }
        "Set" => {
            let refs = rest
                .iter()
                .map(|item| decode_ref(index, item, len, false))
                .collect::<Result<Vec<_>>>()?;
            Ok(Slot::Set(refs))
        }
        // Null-prototype objects from other emitters revive as plain
        // objects; this model has no prototype notion.
        "null" => {
            if rest.len() % 2 != 0 {
                return Err(Error::invalid_input(format!(
                    "slot {index}: null-object row needs key/index pairs"
                )));
            }
            let entries = rest
                .chunks_exact(2)
                .map(|pair| match &pair[0] {
                    Json::String(key) => {
                        Ok((key.clone(), decode_ref(index, &pair[1], len, false)?))
                    }
                    other => Err(Error::invalid_input(format!(
                        "slot {index}: null-object key must be a string, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Slot::Object(entries))
        }
        _ => match rest {
            [payload] => Ok(Slot::Custom {
                tag: tag.to_string(),
                payload: decode_ref(index, payload, len, false)?,
            }),
            _ => Err(Error::invalid_input(format!(
                "slot {index}: unrecognized tag form [{tag:?}, …]"
            ))),
        },
    }
}

/// Decodes a referrer: a non-negative in-range index or an allowed
/// sentinel code. Holes are only legal inside array rows.
fn decode_ref(index: usize, raw: &Json, len: usize, allow_hole: bool) -> Result<Ref> {
    let r = raw
        .as_i64()
        .ok_or_else(|| Error::invalid_input(format!("slot {index}: referrer {raw} is not an integer")))?;
    if r >= 0 {
        if (r as usize) < len {
            return Ok(r);
        }
        return Err(Error::invalid_input(format!(
            "slot {index}: index {r} is out of range for a table of {len} slots"
        )));
    }
    if r == HOLE {
        if allow_hole {
            return Ok(r);
        }
        return Err(Error::invalid_input(format!(
            "slot {index}: hole marker outside an array row"
        )));
    }
    if r >= NEGATIVE_ZERO {
        return Ok(r);
    }
    Err(Error::invalid_input(format!(
        "slot {index}: unknown sentinel code {r}"
    )))
}

#[derive(Clone)]
enum State {
    Empty,
    /// Being hydrated and shell-less; reaching it again means a cycle
    /// through a primitive form.
    InProgress,
    Done(Value),
}

struct Reviver<'a, 'r> {
    slots: &'a [Slot],
    states: Vec<State>,
    revivers: &'a Revivers<'r>,
}

impl<'a, 'r> Reviver<'a, 'r> {
    fn hydrate(&mut self, index: usize) -> Result<Value> {
        match &self.states[index] {
            State::Done(value) => return Ok(value.clone()),
            State::InProgress => return Err(Error::primitive_cycle(index)),
            State::Empty => {}
        }
        let value = match &self.slots[index] {
            Slot::Null => Value::Null,
            Slot::Bool(b) => Value::Bool(*b),
            Slot::Number(n) => Value::Number(*n),
            Slot::String(s) => Value::String(s.clone()),
            Slot::BigInt(b) => Value::BigInt(b.clone()),
            Slot::Date(d) => Value::Date(*d),
            Slot::Regex { source, flags } => Value::regex(source.clone(), flags.clone()),
            Slot::Array(refs) => {
                let refs = refs.clone();
                let node = Value::array(Vec::with_capacity(refs.len()));
                self.states[index] = State::Done(node.clone());
                for r in refs {
                    let element = if r == HOLE {
                        Value::Hole
                    } else {
                        self.resolve(r)?
                    };
                    node.push_element(element);
                }
                return Ok(node);
            }
            Slot::Object(entries) => {
                let entries = entries.clone();
                let node = Value::object(ValueMap::with_capacity(entries.len()));
                self.states[index] = State::Done(node.clone());
                for (key, r) in entries {
                    node.insert_entry(key, self.resolve(r)?);
                }
                return Ok(node);
            }
            Slot::Map(pairs) => {
                let pairs = pairs.clone();
                let node = Value::map(Vec::with_capacity(pairs.len()));
                self.states[index] = State::Done(node.clone());
                for (key_ref, value_ref) in pairs {
                    let key = self.resolve(key_ref)?;
                    let value = self.resolve(value_ref)?;
                    if let Value::Map(m) = &node {
                        m.borrow_mut().push((key, value));
                    }
                }
                return Ok(node);
            }
            Slot::Set(refs) => {
                let refs = refs.clone();
                let node = Value::set(Vec::with_capacity(refs.len()));
                self.states[index] = State::Done(node.clone());
                for r in refs {
                    let member = self.resolve(r)?;
                    if let Value::Set(s) = &node {
                        s.borrow_mut().push(member);
                    }
                }
                return Ok(node);
            }
            Slot::Custom { tag, payload } => {
                let (tag, payload) = (tag.clone(), *payload);
                self.states[index] = State::InProgress;
                let payload = self.resolve(payload)?;
                let revive = self
                    .revivers
                    .get(&tag)
                    .ok_or_else(|| Error::unknown_type(tag))?;
                revive(payload)?
            }
        };
        self.states[index] = State::Done(value.clone());
        Ok(value)
    }

    fn resolve(&mut self, r: Ref) -> Result<Value> {
        if r >= 0 {
            return self.hydrate(r as usize);
        }
        if r == HOLE {
            return Ok(Value::Hole);
        }
        sentinel_value(r)
            .ok_or_else(|| Error::invalid_input(format!("unknown sentinel code {r}")))
    }
}
