//! Comparison operators. Results are 1, 0 or NULL.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{BooleanArray, Datum as ArrowDatum};
use arrow::compute::kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq};
use arrow::error::ArrowError;

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::Result;
use crate::expression::Expression;
use crate::function::{
    builtin_common, vec_eval_args, BaseBuiltinFunc, BaseFunctionClass, BuiltinFunc,
    FunctionClass,
};
use crate::types::{EvalType, FieldType};

use super::common_eval_type;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Registered function name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }

    fn kernel(
        self,
    ) -> fn(&dyn ArrowDatum, &dyn ArrowDatum) -> std::result::Result<BooleanArray, ArrowError> {
        match self {
            CompareOp::Eq => eq,
            CompareOp::Ne => neq,
            CompareOp::Lt => lt,
            CompareOp::Le => lt_eq,
            CompareOp::Gt => gt,
            CompareOp::Ge => gt_eq,
        }
    }
}

/// Constructor of one comparison operator.
pub struct CompareFunctionClass {
    base: BaseFunctionClass,
    op: CompareOp,
}

impl CompareFunctionClass {
    #[must_use]
    pub fn new(op: CompareOp) -> Self {
        CompareFunctionClass {
            base: BaseFunctionClass::new(op.name(), 2, Some(2)),
            op,
        }
    }
}

impl FunctionClass for CompareFunctionClass {
    fn name(&self) -> &'static str {
        self.base.name
    }

    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>> {
        self.base.verify_args(&args)?;
        let cmp_type = common_eval_type(&args, true);
        let unsigned = [
            args[0].field_type().is_unsigned(),
            args[1].field_type().is_unsigned(),
        ];
        let tp = FieldType::longlong();
        Ok(Box::new(CompareFunc {
            base: BaseBuiltinFunc::new(self.base.name, ctx, args, tp),
            op: self.op,
            cmp_type,
            unsigned,
        }))
    }
}

#[derive(Debug, Clone)]
struct CompareFunc {
    base: BaseBuiltinFunc,
    op: CompareOp,
    cmp_type: EvalType,
    /// Per-argument unsignedness, for int comparisons.
    unsigned: [bool; 2],
}

impl CompareFunc {
    fn widen(&self, idx: usize, v: i64) -> i128 {
        if self.unsigned[idx] {
            i128::from(v as u64)
        } else {
            i128::from(v)
        }
    }

    fn compare_row(&self, row: &Row<'_>) -> Result<Option<Ordering>> {
        let [lhs, rhs] = &self.base.args[..] else {
            return Ok(None);
        };
        let ord = match self.cmp_type {
            EvalType::Int => match (lhs.eval_int(row)?, rhs.eval_int(row)?) {
                (Some(a), Some(b)) => Some(self.widen(0, a).cmp(&self.widen(1, b))),
                _ => None,
            },
            EvalType::String => match (lhs.eval_string(row)?, rhs.eval_string(row)?) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
            // Total order, as in the Arrow kernels: NaN sorts above every number.
            _ => match (lhs.eval_real(row)?, rhs.eval_real(row)?) {
                (Some(a), Some(b)) => Some(a.total_cmp(&b)),
                _ => None,
            },
        };
        Ok(ord)
    }
}

impl BuiltinFunc for CompareFunc {
    builtin_common!(|this, other| this.op == other.op && this.cmp_type == other.cmp_type);

    fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        Ok(self
            .compare_row(row)?
            .map(|ord| i64::from(self.op.holds(ord))))
    }

    fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let kernel = self.op.kernel();
        let bools = match self.cmp_type {
            EvalType::Int if self.unsigned.contains(&true) => {
                // Unsigned operands are widened per row; Arrow kernels need one native type.
                let bools = input
                    .rows()
                    .map(|row| {
                        self.compare_row(&row)
                            .map(|ord| ord.map(|ord| self.op.holds(ord)))
                    })
                    .collect::<Result<BooleanArray>>()?;
                return result.fill(Arc::new(bools));
            }
            EvalType::Int => {
                let bufs = vec_eval_args(&self.base.args, input, EvalType::Int)?;
                kernel(&bufs[0].int64s()?, &bufs[1].int64s()?)?
            }
            EvalType::String => {
                let bufs = vec_eval_args(&self.base.args, input, EvalType::String)?;
                kernel(bufs[0].strings()?, bufs[1].strings()?)?
            }
            _ => {
                let bufs = vec_eval_args(&self.base.args, input, EvalType::Real)?;
                kernel(bufs[0].float64s()?, bufs[1].float64s()?)?
            }
        };
        result.fill(Arc::new(bools))
    }

    fn vectorized(&self) -> bool {
        true
    }
}
