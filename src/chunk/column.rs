//! Output buffer for vectorized evaluation.

use arrow::array::{
    Array, ArrayRef, AsArray, Decimal128Array, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Decimal128Type, Float64Type, Int64Type, UInt64Type};

use crate::error::{ExprError, Result};
use crate::types::EvalType;

/// Mutable result column of one evaluation category.
///
/// Vectorized evaluators write their whole result into the buffer; arrays of
/// a compatible but different Arrow type are cast on the way in.
#[derive(Debug, Clone)]
pub struct Column {
    eval_type: EvalType,
    data: Option<ArrayRef>,
}

impl Column {
    /// Creates an empty buffer for results of `eval_type`.
    #[must_use]
    pub fn new(eval_type: EvalType) -> Self {
        Column {
            eval_type,
            data: None,
        }
    }

    /// Returns the evaluation category of this buffer.
    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        self.eval_type
    }

    /// Replaces the buffer contents.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the array cannot be cast to this category.
    pub fn fill(&mut self, array: ArrayRef) -> Result<()> {
        let array = if self.eval_type.accepts(array.data_type()) {
            array
        } else {
            cast(&array, &self.eval_type.to_arrow())?
        };
        self.data = Some(array);
        Ok(())
    }

    /// Drops the buffer contents.
    pub fn reset(&mut self) {
        self.data = None;
    }

    /// Returns the filled array, if any.
    #[must_use]
    pub fn array(&self) -> Option<&ArrayRef> {
        self.data.as_ref()
    }

    /// Takes the filled array out of the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was never filled.
    pub fn take(&mut self) -> Result<ArrayRef> {
        self.data
            .take()
            .ok_or_else(|| ExprError::EvaluationError("result column was not filled".into()))
    }

    /// Returns the number of values in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |a| a.len())
    }

    /// Returns true if the buffer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if value `i` is NULL.
    #[must_use]
    pub fn is_null(&self, i: usize) -> bool {
        self.data.as_ref().map_or(true, |a| a.is_null(i))
    }

    /// Returns the values as signed integers.
    ///
    /// Unsigned arrays are reinterpreted bit for bit.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or not of the int category.
    pub fn int64s(&self) -> Result<Int64Array> {
        let array = self.filled(EvalType::Int)?;
        match array.data_type() {
            DataType::Int64 => Ok(array.as_primitive::<Int64Type>().clone()),
            _ => Ok(array
                .as_primitive::<UInt64Type>()
                .unary::<_, Int64Type>(|v| v as i64)),
        }
    }

    /// Returns the values as floats.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or not of the real category.
    pub fn float64s(&self) -> Result<&Float64Array> {
        Ok(self.filled(EvalType::Real)?.as_primitive::<Float64Type>())
    }

    /// Returns the values as strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or not of the string category.
    pub fn strings(&self) -> Result<&StringArray> {
        Ok(self.filled(EvalType::String)?.as_string::<i32>())
    }

    /// Returns the values as decimals.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or not of the decimal category.
    pub fn decimals(&self) -> Result<&Decimal128Array> {
        Ok(self.filled(EvalType::Decimal)?.as_primitive::<Decimal128Type>())
    }

    fn filled(&self, expected: EvalType) -> Result<&ArrayRef> {
        if self.eval_type != expected {
            return Err(ExprError::TypeError {
                expected: expected.name().to_string(),
                actual: self.eval_type.name().to_string(),
            });
        }
        self.data
            .as_ref()
            .ok_or_else(|| ExprError::EvaluationError("result column was not filled".into()))
    }
}
