//! Column/expression type descriptors.

use std::fmt;

use arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use serde::{Deserialize, Serialize};

/// Field flag: value can never be NULL.
pub const NOT_NULL_FLAG: u32 = 1;
/// Field flag: integer is unsigned.
pub const UNSIGNED_FLAG: u32 = 1 << 5;
/// Field flag: string compares as bytes.
pub const BINARY_FLAG: u32 = 1 << 7;

/// Physical type code of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    /// Type not decided yet; the caller or a later phase fills it in.
    Unspecified,
    /// 8-bit integer.
    Tiny,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Long,
    /// 64-bit integer.
    LongLong,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Fixed-point decimal.
    NewDecimal,
    /// Variable-length string.
    VarString,
    /// Fixed-length string.
    String,
    /// Calendar date.
    Date,
    /// Date and time of day.
    Datetime,
    /// Point in time.
    Timestamp,
    /// Time interval.
    Duration,
}

impl TypeCode {
    /// Returns the SQL name of the type code.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TypeCode::Unspecified => "UNSPECIFIED",
            TypeCode::Tiny => "TINYINT",
            TypeCode::Short => "SMALLINT",
            TypeCode::Long => "INT",
            TypeCode::LongLong => "BIGINT",
            TypeCode::Float => "FLOAT",
            TypeCode::Double => "DOUBLE",
            TypeCode::NewDecimal => "DECIMAL",
            TypeCode::VarString => "VARCHAR",
            TypeCode::String => "CHAR",
            TypeCode::Date => "DATE",
            TypeCode::Datetime => "DATETIME",
            TypeCode::Timestamp => "TIMESTAMP",
            TypeCode::Duration => "TIME",
        }
    }
}

/// Evaluation category of an expression.
///
/// Every expression is evaluated through exactly one typed evaluator family,
/// picked from its return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    Int,
    Real,
    Decimal,
    String,
    Datetime,
    Duration,
}

impl EvalType {
    /// Returns the lowercase category name used in messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EvalType::Int => "int",
            EvalType::Real => "real",
            EvalType::Decimal => "decimal",
            EvalType::String => "string",
            EvalType::Datetime => "datetime",
            EvalType::Duration => "duration",
        }
    }

    /// Returns the Arrow type vectorized results of this category are stored as.
    #[must_use]
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            EvalType::Int => ArrowDataType::Int64,
            EvalType::Real => ArrowDataType::Float64,
            EvalType::Decimal => ArrowDataType::Decimal128(38, 10),
            EvalType::String => ArrowDataType::Utf8,
            EvalType::Datetime => ArrowDataType::Timestamp(TimeUnit::Microsecond, None),
            EvalType::Duration => ArrowDataType::Duration(TimeUnit::Nanosecond),
        }
    }

    /// Returns true if an Arrow array of `data_type` already holds values of
    /// this category without conversion.
    #[must_use]
    pub fn accepts(&self, data_type: &ArrowDataType) -> bool {
        match self {
            EvalType::Int => matches!(data_type, ArrowDataType::Int64 | ArrowDataType::UInt64),
            EvalType::Real => matches!(data_type, ArrowDataType::Float64),
            EvalType::Decimal => matches!(data_type, ArrowDataType::Decimal128(_, _)),
            EvalType::String => matches!(data_type, ArrowDataType::Utf8),
            EvalType::Datetime => {
                matches!(data_type, ArrowDataType::Timestamp(TimeUnit::Microsecond, _))
            }
            EvalType::Duration => {
                matches!(data_type, ArrowDataType::Duration(TimeUnit::Nanosecond))
            }
        }
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full type descriptor of a field or expression result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    /// Type code.
    pub tp: TypeCode,
    /// Bit set of `*_FLAG` constants.
    pub flag: u32,
    /// Display width / precision, -1 when unknown.
    pub flen: i32,
    /// Scale for decimals, fractional-second precision for temporals.
    pub decimal: i32,
}

impl FieldType {
    /// Creates a type with the given code and no flags.
    #[must_use]
    pub fn new(tp: TypeCode) -> Self {
        FieldType {
            tp,
            flag: 0,
            flen: -1,
            decimal: -1,
        }
    }

    /// The "not decided yet" sentinel type.
    #[must_use]
    pub fn unspecified() -> Self {
        Self::new(TypeCode::Unspecified)
    }

    /// Signed 64-bit integer.
    #[must_use]
    pub fn longlong() -> Self {
        FieldType {
            flen: 20,
            decimal: 0,
            ..Self::new(TypeCode::LongLong)
        }
    }

    /// Unsigned 64-bit integer.
    #[must_use]
    pub fn unsigned_longlong() -> Self {
        Self::longlong().with_flag(UNSIGNED_FLAG)
    }

    /// 64-bit floating point.
    #[must_use]
    pub fn double() -> Self {
        FieldType {
            flen: 22,
            ..Self::new(TypeCode::Double)
        }
    }

    /// Variable-length string.
    #[must_use]
    pub fn varchar() -> Self {
        Self::new(TypeCode::VarString)
    }

    /// Fixed-point decimal with the given precision and scale.
    #[must_use]
    pub fn decimal(flen: i32, decimal: i32) -> Self {
        FieldType {
            flen,
            decimal,
            ..Self::new(TypeCode::NewDecimal)
        }
    }

    /// Datetime with microsecond precision.
    #[must_use]
    pub fn datetime() -> Self {
        FieldType {
            flen: 26,
            decimal: 6,
            ..Self::new(TypeCode::Datetime)
        }
    }

    /// Time interval.
    #[must_use]
    pub fn duration() -> Self {
        FieldType {
            flen: 17,
            decimal: 6,
            ..Self::new(TypeCode::Duration)
        }
    }

    /// Adds the given flag bits.
    #[must_use]
    pub fn with_flag(mut self, flag: u32) -> Self {
        self.flag |= flag;
        self
    }

    /// Returns true if the type is the unspecified sentinel.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.tp == TypeCode::Unspecified
    }

    /// Returns true if the unsigned flag is set.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        self.flag & UNSIGNED_FLAG != 0
    }

    /// Returns true if the not-null flag is set.
    #[must_use]
    pub fn is_not_null(&self) -> bool {
        self.flag & NOT_NULL_FLAG != 0
    }

    /// Returns the evaluation category of this type.
    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        match self.tp {
            TypeCode::Tiny | TypeCode::Short | TypeCode::Long | TypeCode::LongLong => EvalType::Int,
            TypeCode::Float | TypeCode::Double => EvalType::Real,
            TypeCode::NewDecimal => EvalType::Decimal,
            TypeCode::Date | TypeCode::Datetime | TypeCode::Timestamp => EvalType::Datetime,
            TypeCode::Duration => EvalType::Duration,
            TypeCode::Unspecified | TypeCode::VarString | TypeCode::String => EvalType::String,
        }
    }

    /// Converts to an Arrow data type.
    #[must_use]
    pub fn to_arrow(&self) -> ArrowDataType {
        match self.eval_type() {
            EvalType::Int if self.is_unsigned() => ArrowDataType::UInt64,
            EvalType::Decimal => {
                let precision = if self.flen > 0 { self.flen.min(38) as u8 } else { 38 };
                let scale = self.decimal.max(0) as i8;
                ArrowDataType::Decimal128(precision, scale)
            }
            other => other.to_arrow(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tp.name())?;
        if self.tp == TypeCode::NewDecimal && self.flen > 0 {
            write!(f, "({},{})", self.flen, self.decimal.max(0))?;
        }
        if self.is_unsigned() {
            f.write_str(" UNSIGNED")?;
        }
        Ok(())
    }
}
