//! sqlexpr - SQL scalar expression trees
//!
//! Typed expression nodes for a SQL engine: construction through a builtin
//! function registry, constant folding, structural hashing, decorrelation,
//! physical index binding, and row-at-a-time or Arrow-vectorized evaluation.

pub mod chunk;
pub mod context;
pub mod error;
pub mod expression;
pub mod function;
pub mod types;

pub use chunk::{Chunk, Column, Row};
pub use context::{EvalContext, StatementContext};
pub use error::{ExprError, Result};
pub use expression::{
    fold_constant, scalar_funcs_to_exprs, Constant, CorrelatedColumn, ExprColumn, Expression,
    ResolveIndicesError, ScalarFunction, Schema,
};
pub use function::{BuiltinFunc, FunctionClass, FunctionRegistry};
pub use types::{Datum, EvalType, FieldType, TypeCode};
