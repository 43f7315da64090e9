//! Runtime values produced by row-at-a-time evaluation.

use std::fmt;
use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, Decimal128Array, DurationNanosecondArray,
    Float64Array, Int64Array, StringArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{
    DataType as ArrowDataType, Date32Type, Decimal128Type, DurationNanosecondType, Float32Type,
    Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
    UInt64Type,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ExprError, Result};

use super::field_type::{EvalType, FieldType};

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Generic runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    /// SQL NULL.
    Null,
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Fixed-point decimal: `value * 10^-scale`.
    Decimal { value: i128, scale: i8 },
    /// Datetime as microseconds since the Unix epoch.
    Time(i64),
    /// Time interval in nanoseconds.
    Duration(i64),
}

// Manual Hash implementation because f64 doesn't implement Hash
impl std::hash::Hash for Datum {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Datum::Int64(v) | Datum::Time(v) | Datum::Duration(v) => v.hash(state),
            Datum::Uint64(v) => v.hash(state),
            Datum::Float64(v) => v.to_bits().hash(state),
            Datum::String(v) => v.hash(state),
            Datum::Decimal { value, scale } => {
                value.hash(state);
                scale.hash(state);
            }
            Datum::Null => {}
        }
    }
}

// Manual Eq implementation because f64 doesn't implement Eq
impl Eq for Datum {}

impl Datum {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Returns the name of the value kind, used in type errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "NULL",
            Datum::Int64(_) => "INT64",
            Datum::Uint64(_) => "UINT64",
            Datum::Float64(_) => "FLOAT64",
            Datum::String(_) => "STRING",
            Datum::Decimal { .. } => "DECIMAL",
            Datum::Time(_) => "DATETIME",
            Datum::Duration(_) => "DURATION",
        }
    }

    /// Reads the value as an integer. Unsigned values keep their bit pattern.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-integer values.
    pub fn to_eval_int(&self) -> Result<Option<i64>> {
        match self {
            Datum::Null => Ok(None),
            Datum::Int64(v) => Ok(Some(*v)),
            Datum::Uint64(v) => Ok(Some(*v as i64)),
            other => Err(Self::type_error("INT64", other)),
        }
    }

    /// Reads the value as a float, widening integers.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-numeric values.
    pub fn to_eval_real(&self) -> Result<Option<f64>> {
        match self {
            Datum::Null => Ok(None),
            Datum::Float64(v) => Ok(Some(*v)),
            Datum::Int64(v) => Ok(Some(*v as f64)),
            Datum::Uint64(v) => Ok(Some(*v as f64)),
            Datum::Decimal { value, scale } => {
                Ok(Some(*value as f64 / 10f64.powi(i32::from(*scale))))
            }
            other => Err(Self::type_error("FLOAT64", other)),
        }
    }

    /// Reads the value as a string; non-string values use their display form.
    #[must_use]
    pub fn to_eval_string(&self) -> Option<String> {
        match self {
            Datum::Null => None,
            Datum::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn type_error(expected: &str, actual: &Datum) -> ExprError {
        ExprError::TypeError {
            expected: expected.to_string(),
            actual: actual.kind_name().to_string(),
        }
    }

    /// Reads row `idx` of an Arrow array as a datum.
    ///
    /// `tp` decides how signed integers are boxed: an unsigned field keeps the
    /// bit pattern as `Uint64`.
    ///
    /// # Errors
    ///
    /// Returns an error for Arrow types that have no datum representation.
    pub fn from_array(array: &dyn Array, idx: usize, tp: &FieldType) -> Result<Datum> {
        if array.is_null(idx) {
            return Ok(Datum::Null);
        }
        let datum = match array.data_type() {
            ArrowDataType::Int64 => {
                let v = array.as_primitive::<Int64Type>().value(idx);
                if tp.is_unsigned() {
                    Datum::Uint64(v as u64)
                } else {
                    Datum::Int64(v)
                }
            }
            ArrowDataType::Int32 => Datum::Int64(i64::from(array.as_primitive::<Int32Type>().value(idx))),
            ArrowDataType::Int16 => Datum::Int64(i64::from(array.as_primitive::<Int16Type>().value(idx))),
            ArrowDataType::Int8 => Datum::Int64(i64::from(array.as_primitive::<Int8Type>().value(idx))),
            ArrowDataType::UInt64 => Datum::Uint64(array.as_primitive::<UInt64Type>().value(idx)),
            ArrowDataType::Boolean => Datum::Int64(i64::from(array.as_boolean().value(idx))),
            ArrowDataType::Float64 => Datum::Float64(array.as_primitive::<Float64Type>().value(idx)),
            ArrowDataType::Float32 => {
                Datum::Float64(f64::from(array.as_primitive::<Float32Type>().value(idx)))
            }
            ArrowDataType::Utf8 => Datum::String(array.as_string::<i32>().value(idx).to_string()),
            ArrowDataType::LargeUtf8 => {
                Datum::String(array.as_string::<i64>().value(idx).to_string())
            }
            ArrowDataType::Decimal128(_, scale) => Datum::Decimal {
                value: array.as_primitive::<Decimal128Type>().value(idx),
                scale: *scale,
            },
            ArrowDataType::Timestamp(TimeUnit::Microsecond, _) => {
                Datum::Time(array.as_primitive::<TimestampMicrosecondType>().value(idx))
            }
            ArrowDataType::Date32 => Datum::Time(
                i64::from(array.as_primitive::<Date32Type>().value(idx)) * MICROS_PER_DAY,
            ),
            ArrowDataType::Duration(TimeUnit::Nanosecond) => {
                Datum::Duration(array.as_primitive::<DurationNanosecondType>().value(idx))
            }
            other => {
                return Err(ExprError::Unsupported(format!(
                    "reading {other:?} column into a datum"
                )))
            }
        };
        Ok(datum)
    }

    /// Creates an array with this value repeated `len` times, typed for `tp`.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value does not fit the category of `tp`.
    pub fn broadcast(&self, tp: &FieldType, len: usize) -> Result<ArrayRef> {
        if self.is_null() {
            return Ok(new_null_array(&tp.to_arrow(), len));
        }
        let array: ArrayRef = match tp.eval_type() {
            EvalType::Int => {
                let v = self.to_eval_int()?.unwrap_or_default();
                if tp.is_unsigned() {
                    Arc::new(UInt64Array::from(vec![v as u64; len]))
                } else {
                    Arc::new(Int64Array::from(vec![v; len]))
                }
            }
            EvalType::Real => {
                let v = self.to_eval_real()?.unwrap_or_default();
                Arc::new(Float64Array::from(vec![v; len]))
            }
            EvalType::String => {
                let v = self.to_eval_string().unwrap_or_default();
                Arc::new(StringArray::from(vec![v.as_str(); len]))
            }
            EvalType::Decimal => match (self, tp.to_arrow()) {
                (Datum::Decimal { value, scale }, ArrowDataType::Decimal128(precision, _)) => {
                    Arc::new(
                        Decimal128Array::from(vec![*value; len])
                            .with_precision_and_scale(precision, *scale)?,
                    )
                }
                (other, _) => return Err(Self::type_error("DECIMAL", other)),
            },
            EvalType::Datetime => match self {
                Datum::Time(v) => Arc::new(TimestampMicrosecondArray::from(vec![*v; len])),
                other => return Err(Self::type_error("DATETIME", other)),
            },
            EvalType::Duration => match self {
                Datum::Duration(v) => Arc::new(DurationNanosecondArray::from(vec![*v; len])),
                other => return Err(Self::type_error("DURATION", other)),
            },
        };
        Ok(array)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Int64(v) => write!(f, "{v}"),
            Datum::Uint64(v) => write!(f, "{v}"),
            Datum::Float64(v) => write!(f, "{v}"),
            Datum::String(s) => f.write_str(s),
            Datum::Decimal { value, scale } => fmt_decimal(f, *value, *scale),
            Datum::Time(us) => match DateTime::from_timestamp_micros(*us) {
                Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
                None => write!(f, "{us}"),
            },
            Datum::Duration(ns) => fmt_duration(f, *ns),
        }
    }
}

fn fmt_decimal(f: &mut fmt::Formatter<'_>, value: i128, scale: i8) -> fmt::Result {
    if scale <= 0 {
        return write!(f, "{}", value * 10i128.pow(u32::from(scale.unsigned_abs())));
    }
    let divisor = 10i128.pow(u32::from(scale.unsigned_abs()));
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let divisor = divisor.unsigned_abs();
    write!(
        f,
        "{sign}{}.{:0width$}",
        abs / divisor,
        abs % divisor,
        width = scale as usize
    )
}

fn fmt_duration(f: &mut fmt::Formatter<'_>, ns: i64) -> fmt::Result {
    let sign = if ns < 0 { "-" } else { "" };
    let abs = ns.unsigned_abs();
    let total_secs = abs / 1_000_000_000;
    let frac_us = (abs % 1_000_000_000) / 1_000;
    write!(
        f,
        "{sign}{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60
    )?;
    if frac_us != 0 {
        write!(f, ".{frac_us:06}")?;
    }
    Ok(())
}
