//! Value and type definitions shared by the expression tree.

pub mod codec;
mod datum;
mod field_type;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use datum::Datum;
pub use field_type::{
    EvalType, FieldType, TypeCode, BINARY_FLAG, NOT_NULL_FLAG, UNSIGNED_FLAG,
};

/// Case-insensitive identifier.
///
/// Keeps the spelling the user wrote next to the lowercase form every
/// comparison, hash and rendering uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiStr {
    /// Original spelling.
    pub o: String,
    /// Lowercase form.
    pub l: String,
}

impl CiStr {
    /// Creates an identifier from its original spelling.
    #[must_use]
    pub fn new(name: &str) -> Self {
        CiStr {
            o: name.to_string(),
            l: name.to_lowercase(),
        }
    }
}

impl fmt::Display for CiStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.o)
    }
}
