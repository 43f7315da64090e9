//! Miscellaneous functions.

use std::sync::Arc;

use arrow::array::Float64Array;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::Result;
use crate::expression::Expression;
use crate::function::{
    builtin_common, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc, FunctionClass,
};
use crate::types::FieldType;

/// Constructor of `rand([seed])`.
///
/// A constant seed fixes the sequence of one node; a seed that depends on
/// the row reseeds per row, so equal seeds give equal values.
pub struct RandFunctionClass {
    base: BaseFunctionClass,
}

impl RandFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        RandFunctionClass {
            base: BaseFunctionClass::new("rand", 0, Some(1)),
        }
    }
}

impl Default for RandFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for RandFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        let (rng, per_row_seed) = match args.first() {
            None => (StdRng::from_entropy(), false),
            Some(seed) if seed.const_item() => {
                let seed = seed.eval_int(&Row::empty())?.unwrap_or(0);
                (StdRng::seed_from_u64(seed as u64), false)
            }
            Some(_) => (StdRng::from_entropy(), true),
        };
        Ok(Box::new(RandFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::double()),
            rng: Mutex::new(rng),
            per_row_seed,
        }))
    }
}

#[derive(Debug)]
struct RandFunc {
    base: BaseBuiltinFunc,
    rng: Mutex<StdRng>,
    per_row_seed: bool,
}

impl Clone for RandFunc {
    /// The copy continues from the same generator state, independently.
    fn clone(&self) -> Self {
        RandFunc {
            base: self.base.clone(),
            rng: Mutex::new(self.rng.lock().clone()),
            per_row_seed: self.per_row_seed,
        }
    }
}

impl RandFunc {
    fn next(&self, row: &Row<'_>) -> Result<f64> {
        if self.per_row_seed {
            let seed = self.base.args[0].eval_int(row)?.unwrap_or(0);
            return Ok(StdRng::seed_from_u64(seed as u64).gen());
        }
        Ok(self.rng.lock().gen())
    }
}

impl BuiltinFunc for RandFunc {
    builtin_common!();

    fn eval_real(&self, row: &Row<'_>) -> Result<Option<f64>> {
        self.next(row).map(Some)
    }

    fn vec_eval_real(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let values = input
            .rows()
            .map(|row| self.next(&row))
            .collect::<Result<Vec<f64>>>()?;
        result.fill(Arc::new(Float64Array::from(values)))
    }

    fn vectorized(&self) -> bool {
        true
    }
}
