//! Wire format reference.
//!
//! This module documents the two output formats. It contains no code; the
//! emitters live in the crate internals and the public entry points are
//! [`stringify`](fn@crate::stringify), [`uneval`](fn@crate::uneval),
//! [`parse`](fn@crate::parse) and [`unflatten`](fn@crate::unflatten).
//!
//! # Data mode: the flat table
//!
//! Data-mode output is a pure JSON document. The top level is either a
//! bare sentinel code (see below) for a sentinel-primitive root, or a
//! JSON array, the *flat table*. Slot `0` is the root. Compound slots
//! never embed their children; they cite other slots by non-negative
//! index, which is what lets one document express sharing and cycles:
//!
//! ```text
//! {"message": "hello", "self": <itself>}
//!   ⇢  [{"message":1,"self":0},"hello"]
//! ```
//!
//! ## Sentinel codes
//!
//! Six small negative integers are reserved; they appear wherever a slot
//! index could, and never as slot indices themselves:
//!
//! | Code | Meaning |
//! |------|------------------------------------|
//! | `-1` | array hole (array rows only) |
//! | `-2` | `undefined` |
//! | `-3` | positive infinity |
//! | `-4` | negative infinity |
//! | `-5` | NaN |
//! | `-6` | negative zero |
//!
//! ## Row shapes
//!
//! | Row | Encodes |
//! |-----|---------|
//! | string, finite number, `true`/`false`, `null` | that primitive, deduplicated structurally |
//! | `{"key": idx, …}` | object; keys are escaped strings |
//! | `[idx, idx, …]` | array; `-1` marks holes |
//! | `["Date", "2001-09-09T01:46:40.000Z"]` | instant, ISO-8601 with milliseconds |
//! | `["RegExp", source]` / `["RegExp", source, flags]` | regular expression |
//! | `["BigInt", "9007199254740993"]` | arbitrary-precision integer |
//! | `["Map", k₁, v₁, k₂, v₂, …]` | ordered map; keys and values are indices |
//! | `["Set", i₁, i₂, …]` | ordered set |
//! | `["null", key, idx, …]` | null-prototype object (accepted on input, revived as a plain object, never emitted) |
//! | `["Tag", idx]` | custom value; `Tag` is any non-built-in string, `idx` is the reduced payload |
//!
//! A first element that is a string marks a tagged row; plain arrays are
//! unambiguous because their elements are always integers.
//!
//! # Code mode
//!
//! Code-mode output is a single JavaScript expression. Trees emit as
//! nested literals (`{a:1}`, `[1,2]`, `new Map([["k","v"]])`,
//! `new Date(1000000000000)`, `123n`, `void 0`). Graphs with sharing or
//! cycles, and sparse arrays, emit as an immediately-invoked function:
//! each such node becomes a parameter bound to an empty shell (`{}`,
//! `Array(n)`, `new Map`, `new Set`), the body wires members with
//! assignments, and cycles work because every shell exists before any
//! assignment runs:
//!
//! ```text
//! (function(a){a.message="hello";a.self=a;return a}({}))
//! ```
//!
//! # Embedding safety
//!
//! Both modes escape `<`, `>`, `/` and the U+2028/U+2029 separators in
//! every string, so the output never contains `</script`, `<!--`, or a
//! raw line separator and can be inlined into an HTML `<script>` element.
//! Code-mode output still executes arbitrary reconstruction logic:
//! evaluate it only when its source is trusted.