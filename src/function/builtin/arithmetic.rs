//! `plus`, `minus`, `mul` and `div`.

use std::sync::Arc;

use arrow::array::{AsArray, Float64Array, Int64Array};
use arrow::compute::kernels::numeric::{add, mul, sub};
use arrow::datatypes::Float64Type;

use crate::chunk::{Chunk, Column, Row};
use crate::context::{EvalContext, MODE_ERROR_FOR_DIVISION_BY_ZERO};
use crate::error::{ExprError, Result};
use crate::expression::Expression;
use crate::function::{
    builtin_common, vec_eval_args, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc,
    FunctionClass,
};
use crate::types::{EvalType, FieldType};

use super::{any_unsigned, common_eval_type, map_kernel_error, overflow};

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Mul,
}

impl ArithOp {
    /// Registered function name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Plus => "plus",
            ArithOp::Minus => "minus",
            ArithOp::Mul => "mul",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Plus => "+",
            ArithOp::Minus => "-",
            ArithOp::Mul => "*",
        }
    }

    fn apply_signed(self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithOp::Plus => a.checked_add(b),
            ArithOp::Minus => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
        }
    }

    fn apply_unsigned(self, a: u64, b: u64) -> Option<u64> {
        match self {
            ArithOp::Plus => a.checked_add(b),
            ArithOp::Minus => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
        }
    }

    fn apply_real(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Plus => a + b,
            ArithOp::Minus => a - b,
            ArithOp::Mul => a * b,
        }
    }
}

/// Constructor of `plus`, `minus` and `mul`.
///
/// Both arguments int gives an int builtin, unsigned if either argument is;
/// anything else is computed in double precision.
pub struct ArithmeticFunctionClass {
    base: BaseFunctionClass,
    op: ArithOp,
}

impl ArithmeticFunctionClass {
    #[must_use]
    pub fn new(op: ArithOp) -> Self {
        ArithmeticFunctionClass {
            base: BaseFunctionClass::new(op.name(), 2, Some(2)),
            op,
        }
    }
}

impl FunctionClass for ArithmeticFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        if common_eval_type(&args, false) == EvalType::Int {
            let tp = if any_unsigned(&args) {
                FieldType::unsigned_longlong()
            } else {
                FieldType::longlong()
            };
            Ok(Box::new(ArithIntFunc {
                base: BaseBuiltinFunc::new(self.base.name, ctx, args, tp),
                op: self.op,
            }))
        } else {
            Ok(Box::new(ArithRealFunc {
                base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::double()),
                op: self.op,
            }))
        }
    }
}

#[derive(Debug, Clone)]
struct ArithIntFunc {
    base: BaseBuiltinFunc,
    op: ArithOp,
}

impl ArithIntFunc {
    fn compute(&self, a: i64, b: i64) -> Result<i64> {
        let value = if self.base.tp.is_unsigned() {
            self.op
                .apply_unsigned(a as u64, b as u64)
                .map(|v| v as i64)
        } else {
            self.op.apply_signed(a, b)
        };
        value.ok_or_else(|| overflow(&self.base.tp, &self.base.args, self.op.symbol()))
    }
}

impl BuiltinFunc for ArithIntFunc {
    builtin_common!(|this, other| this.op == other.op);

    fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        let Some(a) = self.base.args[0].eval_int(row)? else {
            return Ok(None);
        };
        let Some(b) = self.base.args[1].eval_int(row)? else {
            return Ok(None);
        };
        self.compute(a, b).map(Some)
    }

    fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::Int)?;
        let lhs = bufs[0].int64s()?;
        let rhs = bufs[1].int64s()?;

        if self.base.tp.is_unsigned() {
            let values = lhs
                .iter()
                .zip(rhs.iter())
                .map(|pair| match pair {
                    (Some(a), Some(b)) => self.compute(a, b).map(Some),
                    _ => Ok(None),
                })
                .collect::<Result<Int64Array>>()?;
            return result.fill(Arc::new(values));
        }

        let kernel = match self.op {
            ArithOp::Plus => add,
            ArithOp::Minus => sub,
            ArithOp::Mul => mul,
        };
        let array = kernel(&lhs, &rhs)
            .map_err(|e| map_kernel_error(e, &self.base.tp, &self.base.args, self.op.symbol()))?;
        result.fill(array)
    }

    fn vectorized(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct ArithRealFunc {
    base: BaseBuiltinFunc,
    op: ArithOp,
}

impl BuiltinFunc for ArithRealFunc {
    builtin_common!(|this, other| this.op == other.op);

    fn eval_real(&self, row: &Row<'_>) -> Result<Option<f64>> {
        let Some(a) = self.base.args[0].eval_real(row)? else {
            return Ok(None);
        };
        let Some(b) = self.base.args[1].eval_real(row)? else {
            return Ok(None);
        };
        let v = self.op.apply_real(a, b);
        if v.is_infinite() {
            return Err(overflow(&self.base.tp, &self.base.args, self.op.symbol()));
        }
        Ok(Some(v))
    }

    fn vec_eval_real(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::Real)?;
        let lhs = bufs[0].float64s()?;
        let rhs = bufs[1].float64s()?;
        let kernel = match self.op {
            ArithOp::Plus => add,
            ArithOp::Minus => sub,
            ArithOp::Mul => mul,
        };
        let array = kernel(lhs, rhs)?;
        let overflowed = array
            .as_primitive::<Float64Type>()
            .iter()
            .flatten()
            .any(f64::is_infinite);
        if overflowed {
            return Err(overflow(&self.base.tp, &self.base.args, self.op.symbol()));
        }
        result.fill(array)
    }

    fn vectorized(&self) -> bool {
        true
    }
}

/// Constructor of `div`: real division, NULL on a zero divisor unless the
/// session asks for an error.
pub struct DivFunctionClass {
    base: BaseFunctionClass,
}

impl DivFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        DivFunctionClass {
            base: BaseFunctionClass::new("div", 2, Some(2)),
        }
    }
}

impl Default for DivFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for DivFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(DivRealFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::double()),
        }))
    }
}

#[derive(Debug, Clone)]
struct DivRealFunc {
    base: BaseBuiltinFunc,
}

impl DivRealFunc {
    fn compute(&self, a: f64, b: f64) -> Result<Option<f64>> {
        if b == 0.0 {
            if self.base.ctx.has_mode(MODE_ERROR_FOR_DIVISION_BY_ZERO) {
                return Err(ExprError::DivisionByZero);
            }
            return Ok(None);
        }
        let v = a / b;
        if v.is_infinite() {
            return Err(overflow(&self.base.tp, &self.base.args, "/"));
        }
        Ok(Some(v))
    }
}

impl BuiltinFunc for DivRealFunc {
    builtin_common!();

    fn eval_real(&self, row: &Row<'_>) -> Result<Option<f64>> {
        let Some(a) = self.base.args[0].eval_real(row)? else {
            return Ok(None);
        };
        let Some(b) = self.base.args[1].eval_real(row)? else {
            return Ok(None);
        };
        self.compute(a, b)
    }

    fn vec_eval_real(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::Real)?;
        let lhs = bufs[0].float64s()?;
        let rhs = bufs[1].float64s()?;
        let values = lhs
            .iter()
            .zip(rhs.iter())
            .map(|pair| match pair {
                (Some(a), Some(b)) => self.compute(a, b),
                _ => Ok(None),
            })
            .collect::<Result<Float64Array>>()?;
        result.fill(Arc::new(values))
    }

    fn vectorized(&self) -> bool {
        true
    }
}
