//! Bitwise operators.

use std::sync::Arc;

use arrow::compute::kernels::bitwise::bitwise_not;

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::Result;
use crate::expression::Expression;
use crate::function::{
    builtin_common, vec_eval_args, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc,
    FunctionClass,
};
use crate::types::{EvalType, FieldType};

/// Constructor of `bitneg` (`~x`), which always yields an unsigned integer.
pub struct BitNegFunctionClass {
    base: BaseFunctionClass,
}

impl BitNegFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        BitNegFunctionClass {
            base: BaseFunctionClass::new("bitneg", 1, Some(1)),
        }
    }
}

impl Default for BitNegFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for BitNegFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(BitNegFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::unsigned_longlong()),
        }))
    }
}

#[derive(Debug, Clone)]
struct BitNegFunc {
    base: BaseBuiltinFunc,
}

impl BuiltinFunc for BitNegFunc {
    builtin_common!();

    fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        Ok(self.base.args[0].eval_int(row)?.map(|v| !v))
    }

    fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::Int)?;
        let negated = bitwise_not(&bufs[0].int64s()?)?;
        result.fill(Arc::new(negated))
    }

    fn vectorized(&self) -> bool {
        true
    }
}
