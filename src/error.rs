//! Error types for graph serialization and revival.
//!
//! Every failure carries enough context to locate the offending value:
//! serialization errors name the leaf by the traversal path that reached
//! it (e.g. `.object.array[0].get("key")`), revival errors name the slot
//! or tag that was malformed.
//!
//! ## Error categories
//!
//! - [`Error::UnsupportedValue`]: a value with no native encoding and no
//!   matching reducer was reached during `stringify`/`uneval`
//! - [`Error::UnknownType`]: a tagged row was revived with no reviver
//!   registered for its tag
//! - [`Error::InvalidInput`]: the flat table is malformed (bad JSON,
//!   out-of-range index, wrong row shape, unrecognized tag form)
//! - [`Error::CycleInPrimitiveForm`]: a row with no shell form (a tagged
//!   primitive or custom payload) was re-entered while being hydrated
//!
//! ## Examples
//!
//! ```rust
//! use revalue::{parse, Error};
//!
//! let result = parse("[{\"loop\":99}]");
//! assert!(matches!(result, Err(Error::InvalidInput { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// All errors produced by serialization and revival.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A value that cannot be encoded: an opaque value no reducer
    /// claimed, or a hole outside an array.
    #[error("cannot serialize {kind} at {path}")]
    UnsupportedValue {
        /// Kind name of the offending leaf (e.g. `"opaque Vector"`).
        kind: String,
        /// Traversal breadcrumb locating the leaf in the input graph.
        path: String,
    },

    /// A tagged row whose tag has no registered reviver.
    #[error("no reviver registered for type {tag:?}")]
    UnknownType { tag: String },

    /// The flat table is malformed.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A primitive-form row was reached again while still being revived.
    /// Well-formed tables never produce this; it guards against crafted
    /// input where e.g. a custom payload cites its own slot.
    #[error("cyclic reference through a primitive form at slot {index}")]
    CycleInPrimitiveForm { index: usize },
}

impl Error {
    /// Creates an [`Error::UnsupportedValue`] for the leaf named by `kind`
    /// at the given traversal path.
    pub fn unsupported(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Error::UnsupportedValue {
            kind: kind.into(),
            path: path.into(),
        }
    }

    /// Creates an [`Error::UnknownType`] for an unregistered tag.
    pub fn unknown_type(tag: impl Into<String>) -> Self {
        Error::UnknownType { tag: tag.into() }
    }

    /// Creates an [`Error::InvalidInput`] with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use revalue::Error;
    ///
    /// let err = Error::invalid_input("slot 3 cites index 9 but the table has 4 slots");
    /// assert!(err.to_string().contains("slot 3"));
    /// ```
    pub fn invalid_input<T: fmt::Display>(reason: T) -> Self {
        Error::InvalidInput {
            reason: reason.to_string(),
        }
    }

    /// Creates an [`Error::CycleInPrimitiveForm`] for the given slot.
    pub fn primitive_cycle(index: usize) -> Self {
        Error::CycleInPrimitiveForm { index }
    }

    /// The traversal path attached to this error, if it has one.
    ///
    /// Only serialization-side errors carry a path; revival errors locate
    /// the problem by slot index instead.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::UnsupportedValue { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_input(format!("malformed JSON: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_value_exposes_path() {
        let err = Error::unsupported("function", ".object.array[0]");
        assert_eq!(err.path(), Some(".object.array[0]"));
        assert!(err.to_string().contains(".object.array[0]"));
    }

    #[test]
    fn revival_errors_have_no_path() {
        assert_eq!(Error::unknown_type("Vector").path(), None);
        assert_eq!(Error::invalid_input("empty table").path(), None);
        assert_eq!(Error::primitive_cycle(2).path(), None);
    }

    #[test]
    fn json_errors_become_invalid_input() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(err.to_string().contains("malformed JSON"));
    }
}
