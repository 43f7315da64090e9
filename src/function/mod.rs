//! Builtin function capability.
//!
//! A builtin is created by its [`FunctionClass`] once the planner knows the
//! argument list, and from then on is owned by exactly one scalar-function
//! node. Each builtin implements only the evaluators of its own category;
//! the rest fall back to the `Unsupported` defaults below.

pub mod builtin;
mod registry;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::chunk::{Chunk, Column, Row};
use crate::context::EvalContext;
use crate::error::{ExprError, Result};
use crate::expression::Expression;
use crate::types::FieldType;

pub use registry::FunctionRegistry;

/// A bound builtin: evaluators plus the argument list they read from.
pub trait BuiltinFunc: fmt::Debug + Send + Sync {
    /// Lowercase name of the function this builtin implements.
    fn name(&self) -> &str;

    /// Evaluates one row as an integer; `None` is SQL NULL.
    fn eval_int(&self, _row: &Row<'_>) -> Result<Option<i64>> {
        Err(ExprError::unsupported_eval(self.name(), "int"))
    }

    /// Evaluates one row as a float.
    fn eval_real(&self, _row: &Row<'_>) -> Result<Option<f64>> {
        Err(ExprError::unsupported_eval(self.name(), "real"))
    }

    /// Evaluates one row as a string.
    fn eval_string(&self, _row: &Row<'_>) -> Result<Option<String>> {
        Err(ExprError::unsupported_eval(self.name(), "string"))
    }

    fn vec_eval_int(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized int"))
    }

    fn vec_eval_real(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized real"))
    }

    fn vec_eval_string(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized string"))
    }

    fn vec_eval_decimal(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized decimal"))
    }

    fn vec_eval_time(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized time"))
    }

    fn vec_eval_duration(&self, _input: &Chunk, _result: &mut Column) -> Result<()> {
        Err(ExprError::unsupported_eval(self.name(), "vectorized duration"))
    }

    /// Returns true if this builtin implements the vectorized evaluator of
    /// its return category.
    fn vectorized(&self) -> bool {
        false
    }

    /// Returns true if every argument can be evaluated vectorized.
    fn children_vectorized(&self) -> bool {
        self.args().iter().all(Expression::vectorized)
    }

    /// Arguments in call order.
    fn args(&self) -> &[Expression];

    /// Mutable argument slots. The slice length is fixed at construction.
    fn args_mut(&mut self) -> &mut [Expression];

    /// Return type inferred by the builtin.
    fn return_type(&self) -> &FieldType;

    /// Evaluation settings the builtin was created with.
    fn ctx(&self) -> &Arc<EvalContext>;

    /// Deep copy, arguments included.
    fn clone_box(&self) -> Box<dyn BuiltinFunc>;

    /// Structural equality: same implementation and pairwise-equal arguments.
    fn equal(&self, other: &dyn BuiltinFunc) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn BuiltinFunc> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Constructor of one named builtin.
pub trait FunctionClass: Send + Sync {
    /// Lowercase name the class is registered under.
    fn name(&self) -> &'static str;

    /// Validates `args` and binds a builtin instance owning them.
    ///
    /// # Errors
    ///
    /// Returns `IncorrectParameterCount` or a type error when the arguments do
    /// not fit any signature of the function.
    fn get_function(
        &self,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
    ) -> Result<Box<dyn BuiltinFunc>>;
}

/// Arity bounds shared by function classes.
#[derive(Debug, Clone, Copy)]
pub struct BaseFunctionClass {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions.
    pub max_args: Option<usize>,
}

impl BaseFunctionClass {
    #[must_use]
    pub const fn new(name: &'static str, min_args: usize, max_args: Option<usize>) -> Self {
        BaseFunctionClass {
            name,
            min_args,
            max_args,
        }
    }

    /// Checks the argument count.
    ///
    /// # Errors
    ///
    /// Returns `IncorrectParameterCount` when out of bounds.
    pub fn verify_args(&self, args: &[Expression]) -> Result<()> {
        let n = args.len();
        let too_many = self.max_args.is_some_and(|max| n > max);
        if n < self.min_args || too_many {
            let expected = match self.max_args {
                Some(max) if max == self.min_args => max.to_string(),
                Some(max) => format!("{}..={max}", self.min_args),
                None => format!("at least {}", self.min_args),
            };
            return Err(ExprError::IncorrectParameterCount {
                name: self.name.to_string(),
                expected,
                actual: n,
            });
        }
        Ok(())
    }
}

/// State every builtin carries: its arguments, return type and context.
#[derive(Debug, Clone)]
pub struct BaseBuiltinFunc {
    pub name: &'static str,
    pub args: Vec<Expression>,
    pub tp: FieldType,
    pub ctx: Arc<EvalContext>,
}

impl BaseBuiltinFunc {
    #[must_use]
    pub fn new(
        name: &'static str,
        ctx: &Arc<EvalContext>,
        args: Vec<Expression>,
        tp: FieldType,
    ) -> Self {
        BaseBuiltinFunc {
            name,
            args,
            tp,
            ctx: Arc::clone(ctx),
        }
    }

    /// Pairwise argument equality.
    #[must_use]
    pub fn equal(&self, other: &BaseBuiltinFunc) -> bool {
        self.args.len() == other.args.len()
            && self
                .args
                .iter()
                .zip(&other.args)
                .all(|(a, b)| a.equal(b))
    }
}

/// Implements the bookkeeping part of [`BuiltinFunc`] for a struct with a
/// `base: BaseBuiltinFunc` field and a `Clone` impl.
///
/// The optional closure-like argument adds a same-kind check on top of
/// argument equality, for builtins parameterized by an operator.
macro_rules! builtin_common {
    () => {
        $crate::function::builtin_common!(|this, other| true);
    };
    (|$this:ident, $other:ident| $same:expr) => {
        fn name(&self) -> &str {
            self.base.name
        }

        fn args(&self) -> &[$crate::expression::Expression] {
            &self.base.args
        }

        fn args_mut(&mut self) -> &mut [$crate::expression::Expression] {
            &mut self.base.args
        }

        fn return_type(&self) -> &$crate::types::FieldType {
            &self.base.tp
        }

        fn ctx(&self) -> &std::sync::Arc<$crate::context::EvalContext> {
            &self.base.ctx
        }

        fn clone_box(&self) -> Box<dyn $crate::function::BuiltinFunc> {
            Box::new(self.clone())
        }

        fn equal(&self, other: &dyn $crate::function::BuiltinFunc) -> bool {
            match other.as_any().downcast_ref::<Self>() {
                Some($other) => {
                    let $this = self;
                    $same && $this.base.equal(&$other.base)
                }
                None => false,
            }
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    };
}

pub(crate) use builtin_common;

/// Evaluates every argument vectorized into a fresh buffer of `eval_type`.
pub(crate) fn vec_eval_args(
    args: &[Expression],
    input: &Chunk,
    eval_type: crate::types::EvalType,
) -> Result<Vec<Column>> {
    args.iter()
        .map(|arg| {
            let mut buf = Column::new(eval_type);
            arg.vec_eval(input, &mut buf)?;
            Ok(buf)
        })
        .collect()
}
