//! String functions.

use std::sync::Arc;

use arrow::array::{Array, StringArray, StringBuilder};
use arrow::compute::kernels::length::length;

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::Result;
use crate::expression::Expression;
use crate::function::{
    builtin_common, vec_eval_args, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc,
    FunctionClass,
};
use crate::types::{EvalType, FieldType};

/// Constructor of `concat`. NULL if any argument is NULL.
pub struct ConcatFunctionClass {
    base: BaseFunctionClass,
}

impl ConcatFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        ConcatFunctionClass {
            base: BaseFunctionClass::new("concat", 1, None),
        }
    }
}

impl Default for ConcatFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for ConcatFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(ConcatFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::varchar()),
        }))
    }
}

#[derive(Debug, Clone)]
struct ConcatFunc {
    base: BaseBuiltinFunc,
}

impl BuiltinFunc for ConcatFunc {
    builtin_common!();

    fn eval_string(&self, row: &Row<'_>) -> Result<Option<String>> {
        let mut out = String::new();
        for arg in &self.base.args {
            match arg.eval_string(row)? {
                Some(s) => out.push_str(&s),
                None => return Ok(None),
            }
        }
        Ok(Some(out))
    }

    fn vec_eval_string(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::String)?;
        let arrays = bufs
            .iter()
            .map(Column::strings)
            .collect::<Result<Vec<&StringArray>>>()?;

        let mut builder = StringBuilder::with_capacity(input.num_rows(), input.num_rows() * 8);
        let mut value = String::new();
        for i in 0..input.num_rows() {
            if arrays.iter().any(|a| a.is_null(i)) {
                builder.append_null();
                continue;
            }
            value.clear();
            for a in &arrays {
                value.push_str(a.value(i));
            }
            builder.append_value(&value);
        }
        result.fill(Arc::new(builder.finish()))
    }

    fn vectorized(&self) -> bool {
        true
    }
}

/// Constructor of `lower` and `upper`.
pub struct StringCaseFunctionClass {
    base: BaseFunctionClass,
    upper: bool,
}

impl StringCaseFunctionClass {
    #[must_use]
    pub fn lower() -> Self {
        StringCaseFunctionClass {
            base: BaseFunctionClass::new("lower", 1, Some(1)),
            upper: false,
        }
    }

    #[must_use]
    pub fn upper() -> Self {
        StringCaseFunctionClass {
            base: BaseFunctionClass::new("upper", 1, Some(1)),
            upper: true,
        }
    }
}

impl FunctionClass for StringCaseFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(StringCaseFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::varchar()),
            upper: self.upper,
        }))
    }
}

#[derive(Debug, Clone)]
struct StringCaseFunc {
    base: BaseBuiltinFunc,
    upper: bool,
}

impl StringCaseFunc {
    fn convert(&self, s: &str) -> String {
        if self.upper {
            s.to_uppercase()
        } else {
            s.to_lowercase()
        }
    }
}

impl BuiltinFunc for StringCaseFunc {
    builtin_common!(|this, other| this.upper == other.upper);

    fn eval_string(&self, row: &Row<'_>) -> Result<Option<String>> {
        Ok(self.base.args[0]
            .eval_string(row)?
            .map(|s| self.convert(&s)))
    }

    fn vec_eval_string(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::String)?;
        let converted: StringArray = bufs[0]
            .strings()?
            .iter()
            .map(|s| s.map(|s| self.convert(s)))
            .collect();
        result.fill(Arc::new(converted))
    }

    fn vectorized(&self) -> bool {
        true
    }
}

/// Constructor of `length`: length in bytes.
pub struct LengthFunctionClass {
    base: BaseFunctionClass,
}

impl LengthFunctionClass {
    #[must_use]
    pub fn new() -> Self {
        LengthFunctionClass {
            base: BaseFunctionClass::new("length", 1, Some(1)),
        }
    }
}

impl Default for LengthFunctionClass {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for LengthFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        Ok(Box::new(LengthFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, FieldType::longlong()),
        }))
    }
}

#[derive(Debug, Clone)]
struct LengthFunc {
    base: BaseBuiltinFunc,
}

impl BuiltinFunc for LengthFunc {
    builtin_common!();

    fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        Ok(self.base.args[0]
            .eval_string(row)?
            .map(|s| s.len() as i64))
    }

    fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let bufs = vec_eval_args(&self.base.args, input, EvalType::String)?;
        // Int32 for Utf8; widened by the buffer.
        result.fill(length(bufs[0].strings()?)?)
    }

    fn vectorized(&self) -> bool {
        true
    }
}
