//! Literal value node.

use std::fmt;
use std::sync::OnceLock;

use crate::chunk::{Chunk, Column};
use crate::context::StatementContext;
use crate::error::Result;
use crate::types::{codec, Datum, FieldType};

use super::CONSTANT_FLAG;

/// Literal value with its declared type.
///
/// The value is part of the memoized hash key, so it is only reachable
/// through [`Constant::set_value`], which drops the cached key.
#[derive(Debug, Clone)]
pub struct Constant {
    value: Datum,
    pub ret_type: FieldType,
    hash_code: OnceLock<Vec<u8>>,
}

impl Constant {
    #[must_use]
    pub fn new(value: Datum, ret_type: FieldType) -> Self {
        Constant {
            value,
            ret_type,
            hash_code: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::new(Datum::Int64(v), FieldType::longlong())
    }

    #[must_use]
    pub fn uint(v: u64) -> Self {
        Self::new(Datum::Uint64(v), FieldType::unsigned_longlong())
    }

    #[must_use]
    pub fn real(v: f64) -> Self {
        Self::new(Datum::Float64(v), FieldType::double())
    }

    #[must_use]
    pub fn string(v: impl Into<String>) -> Self {
        Self::new(Datum::String(v.into()), FieldType::varchar())
    }

    #[must_use]
    pub fn decimal(value: i128, precision: i32, scale: i8) -> Self {
        Self::new(
            Datum::Decimal { value, scale },
            FieldType::decimal(precision, i32::from(scale)),
        )
    }

    /// Typeless NULL.
    #[must_use]
    pub fn null() -> Self {
        Self::new(Datum::Null, FieldType::unspecified())
    }

    #[must_use]
    pub fn value(&self) -> &Datum {
        &self.value
    }

    /// Replaces the literal and invalidates the cached hash key.
    pub fn set_value(&mut self, value: Datum) {
        self.value = value;
        self.hash_code.take();
    }

    pub(crate) fn vec_eval(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        result.fill(self.value.broadcast(&self.ret_type, input.num_rows())?)
    }

    pub(crate) fn hash_code(&self, sc: &StatementContext) -> &[u8] {
        self.hash_code.get_or_init(|| {
            let mut buf = vec![CONSTANT_FLAG];
            codec::encode_datum(&mut buf, &self.value, sc);
            buf
        })
    }

    /// Same value of the same evaluation category.
    #[must_use]
    pub fn equal(&self, other: &Constant) -> bool {
        self.ret_type.eval_type() == other.ret_type.eval_type() && self.value == other.value
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}
