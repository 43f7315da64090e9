//! Scalar-function node contracts.

mod construction_contract;
mod evaluation_contract;
mod hash_contract;
mod rewrite_contract;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;

use sqlexpr::{Chunk, EvalContext, ExprColumn, Expression, FieldType, ScalarFunction};

pub fn ctx() -> Arc<EvalContext> {
    Arc::new(EvalContext::default())
}

/// `t.a` (int), `t.b` (int), `t.x` (double), `t.s` (string) at offsets 0..4.
pub fn test_chunk() -> Chunk {
    let schema = Arc::new(ArrowSchema::new(vec![
        Field::new("t.a", DataType::Int64, true),
        Field::new("t.b", DataType::Int64, true),
        Field::new("t.x", DataType::Float64, true),
        Field::new("t.s", DataType::Utf8, true),
    ]));
    let a = Arc::new(Int64Array::from(vec![Some(1), Some(2), None, Some(4)])) as ArrayRef;
    let b = Arc::new(Int64Array::from(vec![Some(10), Some(20), Some(30), None])) as ArrayRef;
    let x = Arc::new(Float64Array::from(vec![Some(0.5), Some(1.5), Some(2.5), Some(3.5)]))
        as ArrayRef;
    let s = Arc::new(StringArray::from(vec![Some("ab"), None, Some("cd"), Some("ef")]))
        as ArrayRef;
    Chunk::new(RecordBatch::try_new(schema, vec![a, b, x, s]).unwrap())
}

pub fn col_a() -> ExprColumn {
    ExprColumn::new(1, "t.a", FieldType::longlong())
}

pub fn col_b() -> ExprColumn {
    ExprColumn::new(2, "t.b", FieldType::longlong()).with_index(1)
}

pub fn col_x() -> ExprColumn {
    ExprColumn::new(3, "t.x", FieldType::double()).with_index(2)
}

pub fn col_s() -> ExprColumn {
    ExprColumn::new(4, "t.s", FieldType::varchar()).with_index(3)
}

/// Builds an unfolded call.
pub fn call(name: &str, tp: FieldType, args: Vec<Expression>) -> Expression {
    ScalarFunction::new_function_base(&ctx(), name, Some(tp), args).unwrap()
}

/// Builtin with a fixed return type whose int evaluator returns `value`.
#[derive(Debug, Clone)]
pub struct StubFunc {
    pub args: Vec<Expression>,
    pub tp: FieldType,
    pub value: i64,
    pub ctx: Arc<EvalContext>,
}

impl sqlexpr::BuiltinFunc for StubFunc {
    fn name(&self) -> &str {
        "stub"
    }

    fn eval_int(&self, _row: &sqlexpr::Row<'_>) -> sqlexpr::Result<Option<i64>> {
        Ok(Some(self.value))
    }

    fn args(&self) -> &[Expression] {
        &self.args
    }

    fn args_mut(&mut self) -> &mut [Expression] {
        &mut self.args
    }

    fn return_type(&self) -> &FieldType {
        &self.tp
    }

    fn ctx(&self) -> &Arc<EvalContext> {
        &self.ctx
    }

    fn clone_box(&self) -> Box<dyn sqlexpr::BuiltinFunc> {
        Box::new(self.clone())
    }

    fn equal(&self, other: &dyn sqlexpr::BuiltinFunc) -> bool {
        other
            .as_any()
            .downcast_ref::<StubFunc>()
            .is_some_and(|o| o.value == self.value)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Registers as `stub`; every instance has return type `tp`.
pub struct StubClass {
    pub tp: FieldType,
    pub value: i64,
}

impl sqlexpr::FunctionClass for StubClass {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> sqlexpr::Result<Box<dyn sqlexpr::BuiltinFunc>> {
        Ok(Box::new(StubFunc {
            args,
            tp: self.tp.clone(),
            value: self.value,
            ctx: Arc::clone(ctx),
        }))
    }
}

pub fn stub_registry(tp: FieldType, value: i64) -> sqlexpr::FunctionRegistry {
    let mut registry = sqlexpr::FunctionRegistry::new();
    registry.register(StubClass { tp, value });
    registry
}
