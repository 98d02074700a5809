//! Data-mode emission: flat table → JSON text.
//!
//! Each slot renders as one JSON value per the wire encoding (see
//! [`format`](crate::format)): primitives as themselves, objects as
//! `{key: index}`, arrays as index lists, everything tagged as a
//! `["Tag", …]` row. Strings and keys go through the
//! [escaper](crate::escape), so the document is also safe inside an HTML
//! `<script>` block.
//!
//! Numbers are written with `itoa`/`ryu`: integral doubles in the
//! double-safe range print as integers (`30`, not `30.0`), everything
//! else in shortest round-trip form.

use crate::escape;
use crate::flatten::{FlatTable, Ref, Slot};
use crate::value::MAX_SAFE_INTEGER;
use chrono::SecondsFormat;

/// Writes a finite, non-negative-zero double in JSON-legal form.
pub(crate) fn write_number(out: &mut String, n: f64) {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        out.push_str(itoa::Buffer::new().format(n as i64));
    } else {
        out.push_str(ryu::Buffer::new().format_finite(n));
    }
}

fn write_ref(out: &mut String, r: Ref) {
    out.push_str(itoa::Buffer::new().format(r));
}

/// Renders a flat table as a JSON document. Sentinel-primitive roots
/// render bare (`stringify(-0)` is just `-6`).
pub(crate) fn render(table: &FlatTable) -> String {
    if table.root < 0 {
        return itoa::Buffer::new().format(table.root).to_string();
    }
    let mut out = String::with_capacity(table.slots.len() * 16 + 2);
    out.push('[');
    for (i, slot) in table.slots.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_slot(&mut out, slot);
    }
    out.push(']');
    out
}

fn write_slot(out: &mut String, slot: &Slot) {
    match slot {
        Slot::Number(n) => write_number(out, *n),
        Slot::Bool(true) => out.push_str("true"),
        Slot::Bool(false) => out.push_str("false"),
        Slot::Null => out.push_str("null"),
        Slot::String(s) => escape::escape_into(out, s),
        Slot::BigInt(b) => {
            out.push_str("[\"BigInt\",");
            escape::escape_into(out, &b.to_string());
            out.push(']');
        }
        Slot::Date(d) => {
            out.push_str("[\"Date\",");
            escape::escape_into(out, &d.to_rfc3339_opts(SecondsFormat::Millis, true));
            out.push(']');
        }
        Slot::Regex { source, flags } => {
            out.push_str("[\"RegExp\",");
            escape::escape_into(out, source);
            if !flags.is_empty() {
                out.push(',');
                escape::escape_into(out, flags);
            }
            out.push(']');
        }
        Slot::Object(entries) => {
            out.push('{');
            for (i, (key, r)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                escape::escape_into(out, key);
                out.push(':');
                write_ref(out, *r);
            }
            out.push('}');
        }
        Slot::Array(refs) => {
            out.push('[');
            for (i, r) in refs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_ref(out, *r);
            }
            out.push(']');
        }
        Slot::Map(entries) => {
            out.push_str("[\"Map\"");
            for (key, value) in entries {
                out.push(',');
                write_ref(out, *key);
                out.push(',');
                write_ref(out, *value);
            }
            out.push(']');
        }
        Slot::Set(refs) => {
            out.push_str("[\"Set\"");
            for r in refs {
                out.push(',');
                write_ref(out, *r);
            }
            out.push(']');
        }
        Slot::Custom { tag, payload } => {
            out.push('[');
            escape::escape_into(out, tag);
            out.push(',');
            write_ref(out, *payload);
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_doubles_print_as_integers() {
        let mut out = String::new();
        write_number(&mut out, 30.0);
        assert_eq!(out, "30");

        let mut out = String::new();
        write_number(&mut out, -17.0);
        assert_eq!(out, "-17");
    }

    #[test]
    fn fractional_doubles_keep_their_digits() {
        let mut out = String::new();
        write_number(&mut out, 3.5);
        assert_eq!(out, "3.5");
    }

    #[test]
    fn huge_doubles_use_exponent_form() {
        let mut out = String::new();
        write_number(&mut out, 1e300);
        assert_eq!(out, "1e300");
    }
}
