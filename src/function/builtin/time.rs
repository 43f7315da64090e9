//! Date and time functions.

use std::sync::Arc;

use arrow::array::{DurationNanosecondArray, Int64Array, TimestampMicrosecondArray};
use chrono::Utc;

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::{ExprError, Result};
use crate::expression::Expression;
use crate::function::{
    builtin_common, vec_eval_args, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc,
    FunctionClass,
};
use crate::types::{EvalType, FieldType};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Constructor of `now()`: statement-local current datetime.
pub struct NowFunctionClass {
    base: BaseFunctionClass,
}

impl NowFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        NowFunctionClass {
            base: BaseFunctionClass::new("now", 0, Some(0)),
        }
    }
}

impl Default for NowFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for NowFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(NowFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::datetime()),
        }))
    }
}

#[derive(Debug, Clone)]
struct NowFunc {
    base: BaseBuiltinFunc,
}

impl NowFunc {
    /// Microseconds since the epoch in the statement's time zone.
    fn now_micros(&self) -> i64 {
        let offset = i64::from(self.base.ctx.stmt.time_zone_offset_secs) * 1_000_000;
        Utc::now().timestamp_micros().saturating_add(offset)
    }
}

impl BuiltinFunc for NowFunc {
    builtin_common!();

    fn vec_eval_time(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let now = self.now_micros();
        result.fill(Arc::new(TimestampMicrosecondArray::from(vec![now; input.num_rows()])))
    }

    fn vectorized(&self) -> bool {
        true
    }
}

/// Constructor of `unix_timestamp()`: seconds since the epoch.
pub struct UnixTimestampFunctionClass {
    base: BaseFunctionClass,
}

impl UnixTimestampFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        UnixTimestampFunctionClass {
            base: BaseFunctionClass::new("unix_timestamp", 0, Some(0)),
        }
    }
}

impl Default for UnixTimestampFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for UnixTimestampFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(UnixTimestampFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::longlong()),
        }))
    }
}

#[derive(Debug, Clone)]
struct UnixTimestampFunc {
    base: BaseBuiltinFunc,
}

impl BuiltinFunc for UnixTimestampFunc {
    builtin_common!();

    fn eval_int(&self, _row: &Row<'_>) -> Result<Option<i64>> {
        Ok(Some(Utc::now().timestamp()))
    }

    fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let now = Utc::now().timestamp();
        result.fill(Arc::new(Int64Array::from(vec![now; input.num_rows()])))
    }

    fn vectorized(&self) -> bool {
        true
    }
}

/// Constructor of `sec_to_time(n)`: a duration of `n` seconds.
pub struct SecToTimeFunctionClass {
    base: BaseFunctionClass,
}

impl SecToTimeFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        SecToTimeFunctionClass {
            base: BaseFunctionClass::new("sec_to_time", 1, Some(1)),
        }
    }
}

impl Default for SecToTimeFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for SecToTimeFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(SecToTimeFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::duration()),
        }))
    }
}

#[derive(Debug, Clone)]
struct SecToTimeFunc {
    base: BaseBuiltinFunc,
}

impl BuiltinFunc for SecToTimeFunc {
    builtin_common!();

    fn vec_eval_duration(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::Int)?;
        let nanos = bufs[0]
            .int64s()?
            .iter()
            .map(|secs| match secs {
                Some(s) => s.checked_mul(NANOS_PER_SEC).map(Some).ok_or_else(|| {
                    ExprError::Overflow {
                        type_name: "TIME".to_string(),
                        expr: format!("sec_to_time({s})"),
                    }
                }),
                None => Ok(None),
            })
            .collect::<Result<DurationNanosecondArray>>()?;
        result.fill(Arc::new(nanos))
    }

    fn vectorized(&self) -> bool {
        true
    }
}
