//! Builtin functions shipped with the crate.

mod arithmetic;
mod bit;
mod compare;
mod misc;
mod string;
mod time;

use arrow::error::ArrowError;

use crate::error::ExprError;
use crate::expression::Expression;
use crate::types::{EvalType, FieldType};

pub use arithmetic::{ArithOp, ArithmeticFunctionClass, DivFunctionClass};
pub use bit::BitNegFunctionClass;
pub use compare::{CompareFunctionClass, CompareOp};
pub use misc::RandFunctionClass;
pub use string::{ConcatFunctionClass, LengthFunctionClass, StringCaseFunctionClass};
pub use time::{NowFunctionClass, SecToTimeFunctionClass, UnixTimestampFunctionClass};

use super::FunctionRegistry;

/// Registers every builtin of this module.
pub fn register_all(registry: &mut FunctionRegistry) {
    for op in [ArithOp::Plus, ArithOp::Minus, ArithOp::Mul] {
        registry.register(ArithmeticFunctionClass::new(op));
    }
    registry.register(DivFunctionClass::new());
    for op in [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Gt,
        CompareOp::Ge,
    ] {
        registry.register(CompareFunctionClass::new(op));
    }
    registry.register(BitNegFunctionClass::new());
    registry.register(ConcatFunctionClass::new());
    registry.register(StringCaseFunctionClass::lower());
    registry.register(StringCaseFunctionClass::upper());
    registry.register(LengthFunctionClass::new());
    registry.register(RandFunctionClass::new());
    registry.register(NowFunctionClass::new());
    registry.register(UnixTimestampFunctionClass::new());
    registry.register(SecToTimeFunctionClass::new());
}

/// Signature category shared by every argument, as operators pick it:
/// int only if all arguments are int, string only if all are string.
fn common_eval_type(args: &[Expression], allow_string: bool) -> EvalType {
    if args.iter().all(|a| a.field_type().eval_type() == EvalType::Int) {
        EvalType::Int
    } else if allow_string
        && args
            .iter()
            .all(|a| a.field_type().eval_type() == EvalType::String)
    {
        EvalType::String
    } else {
        EvalType::Real
    }
}

fn any_unsigned(args: &[Expression]) -> bool {
    args.iter().any(|a| a.field_type().is_unsigned())
}

fn overflow(tp: &FieldType, args: &[Expression], symbol: &str) -> ExprError {
    let type_name = match tp.eval_type() {
        EvalType::Int if tp.is_unsigned() => "BIGINT UNSIGNED",
        EvalType::Int => "BIGINT",
        _ => "DOUBLE",
    };
    let expr = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&format!(" {symbol} "));
    ExprError::Overflow {
        type_name: type_name.to_string(),
        expr: format!("({expr})"),
    }
}

/// Maps an Arrow kernel overflow onto the SQL overflow error.
fn map_kernel_error(err: ArrowError, tp: &FieldType, args: &[Expression], symbol: &str) -> ExprError {
    match err {
        ArrowError::ArithmeticOverflow(_) => overflow(tp, args, symbol),
        ArrowError::DivideByZero => ExprError::DivisionByZero,
        other => ExprError::Arrow(other),
    }
}
