//! Function-call node.

use std::fmt;
use std::sync::{Arc, OnceLock};

use log::{trace, warn};
use serde::{Serialize, Serializer};

use crate::chunk::{Chunk, Column, Row};
use crate::context::{EvalContext, StatementContext};
use crate::error::{ExprError, Result};
use crate::function::{BuiltinFunc, FunctionRegistry};
use crate::types::{codec, CiStr, Datum, EvalType, FieldType};

use super::{fold_constant, Expression, ResolveIndicesError, Schema, SCALAR_FUNCTION_FLAG};

/// Functions whose result must never be folded or reused across evaluations,
/// even when all their arguments are constant.
///
/// Some of these are deterministic within one evaluation; they are listed
/// here because the value may differ between statements or rows.
pub const UNFOLDABLE_FUNCTIONS: &[&str] = &[
    "sysdate",
    "now",
    "current_timestamp",
    "unix_timestamp",
    "rand",
    "uuid",
    "sleep",
    "connection_id",
    "last_insert_id",
    "found_rows",
    "row_count",
    "getvar",
    "setvar",
    "values",
];

/// Call of a builtin function over argument expressions.
///
/// The builtin owns the argument list and is owned by this node alone.
pub struct ScalarFunction {
    func_name: CiStr,
    ret_type: FieldType,
    function: Box<dyn BuiltinFunc>,
    /// Memoized hash key. Cleared by every `&mut` path that can replace an
    /// argument.
    hash_code: OnceLock<Vec<u8>>,
}

impl ScalarFunction {
    /// Builds a function call through the global registry and folds it if
    /// it is constant.
    ///
    /// # Errors
    ///
    /// - `InvalidReturnType` if `ret_type` is `None`
    /// - `FunctionNotFound` if `name` is not registered
    /// - argument errors raised by the function's constructor
    pub fn new_function(
        ctx: &Arc<EvalContext>,
        name: &str,
        ret_type: Option<FieldType>,
        args: Vec<Expression>,
    ) -> Result<Expression> {
        Self::new_function_with_registry(FunctionRegistry::global(), ctx, true, name, ret_type, args)
    }

    /// Like [`ScalarFunction::new_function`] without constant folding.
    ///
    /// # Errors
    ///
    /// Same as [`ScalarFunction::new_function`].
    pub fn new_function_base(
        ctx: &Arc<EvalContext>,
        name: &str,
        ret_type: Option<FieldType>,
        args: Vec<Expression>,
    ) -> Result<Expression> {
        Self::new_function_with_registry(FunctionRegistry::global(), ctx, false, name, ret_type, args)
    }

    /// Like [`ScalarFunction::new_function`], logging the error instead of
    /// returning it. Only for call sites where the arguments are known valid.
    #[must_use]
    pub fn new_function_internal(
        ctx: &Arc<EvalContext>,
        name: &str,
        ret_type: Option<FieldType>,
        args: Vec<Expression>,
    ) -> Option<Expression> {
        match Self::new_function(ctx, name, ret_type, args) {
            Ok(expr) => Some(expr),
            Err(err) => {
                warn!("failed to build scalar function {name}: {err}");
                None
            }
        }
    }

    /// Builds a function call using `registry`.
    ///
    /// The node takes the builtin's own return type, except when the builtin
    /// leaves it unspecified and the caller supplied a concrete one.
    ///
    /// # Errors
    ///
    /// Same as [`ScalarFunction::new_function`]. Folding failures are not
    /// errors; the unfolded node is returned instead.
    pub fn new_function_with_registry(
        registry: &FunctionRegistry,
        ctx: &Arc<EvalContext>,
        fold: bool,
        name: &str,
        ret_type: Option<FieldType>,
        args: Vec<Expression>,
    ) -> Result<Expression> {
        let Some(ret_type) = ret_type else {
            return Err(ExprError::InvalidReturnType);
        };
        let class = registry
            .lookup(name)
            .ok_or_else(|| ExprError::FunctionNotFound {
                name: name.to_string(),
            })?;
        let function = class.get_function(ctx, args)?;

        let builtin_tp = function.return_type();
        let ret_type = if !builtin_tp.is_unspecified() || ret_type.is_unspecified() {
            builtin_tp.clone()
        } else {
            ret_type
        };

        let sf = ScalarFunction {
            func_name: CiStr::new(name),
            ret_type,
            function,
            hash_code: OnceLock::new(),
        };
        if fold {
            Ok(fold_constant(sf.into()))
        } else {
            Ok(sf.into())
        }
    }

    #[must_use]
    pub fn func_name(&self) -> &CiStr {
        &self.func_name
    }

    /// Lowercase function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.func_name.l
    }

    #[must_use]
    pub fn ret_type(&self) -> &FieldType {
        &self.ret_type
    }

    /// The bound builtin.
    #[must_use]
    pub fn function(&self) -> &dyn BuiltinFunc {
        self.function.as_ref()
    }

    #[must_use]
    pub fn args(&self) -> &[Expression] {
        self.function.args()
    }

    /// Mutable argument slots. Drops the memoized hash key.
    pub fn args_mut(&mut self) -> &mut [Expression] {
        self.hash_code.take();
        self.function.args_mut()
    }

    #[must_use]
    pub fn ctx(&self) -> &Arc<EvalContext> {
        self.function.ctx()
    }

    /// Evaluates `input` into an int buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_int(input, result)
    }

    /// Evaluates `input` into a float buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_real(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_real(input, result)
    }

    /// Evaluates `input` into a string buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_string(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_string(input, result)
    }

    /// Evaluates `input` into a decimal buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_decimal(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_decimal(input, result)
    }

    /// Evaluates `input` into a datetime buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_time(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_time(input, result)
    }

    /// Evaluates `input` into a duration buffer.
    ///
    /// # Errors
    ///
    /// Fails if the builtin has no evaluator for this category or its kernel fails.
    pub fn vec_eval_duration(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        self.function.vec_eval_duration(input, result)
    }

    /// True iff the builtin and every argument subtree are vectorized.
    #[must_use]
    pub fn vectorized(&self) -> bool {
        self.function.vectorized() && self.function.children_vectorized()
    }

    /// Evaluates one row into a generic value.
    ///
    /// Only int, real and string results are produced here. Decimal,
    /// datetime and duration nodes yield NULL without calling the builtin;
    /// use the vectorized evaluators for those categories.
    ///
    /// # Errors
    ///
    /// Propagates the builtin's evaluation error.
    pub fn eval(&self, row: &Row<'_>) -> Result<Datum> {
        let tp = &self.ret_type;
        let value = match tp.eval_type() {
            EvalType::Int => self.eval_int(row)?.map(|v| {
                if tp.is_unsigned() {
                    Datum::Uint64(v as u64)
                } else {
                    Datum::Int64(v)
                }
            }),
            EvalType::Real => self.eval_real(row)?.map(Datum::Float64),
            EvalType::String => self.eval_string(row)?.map(Datum::String),
            EvalType::Decimal | EvalType::Datetime | EvalType::Duration => None,
        };
        Ok(value.unwrap_or(Datum::Null))
    }

    /// Evaluates one row as a int.
    ///
    /// # Errors
    ///
    /// Propagates the builtin's evaluation error.
    pub fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        self.function.eval_int(row)
    }

    /// Evaluates one row as a float.
    ///
    /// # Errors
    ///
    /// Propagates the builtin's evaluation error.
    pub fn eval_real(&self, row: &Row<'_>) -> Result<Option<f64>> {
        self.function.eval_real(row)
    }

    /// Evaluates one row as a string.
    ///
    /// # Errors
    ///
    /// Propagates the builtin's evaluation error.
    pub fn eval_string(&self, row: &Row<'_>) -> Result<Option<String>> {
        self.function.eval_string(row)
    }

    /// Returns the structural hash key: a tag byte, the compact-encoded
    /// lowercase name, then each argument's key in call order.
    ///
    /// The first call computes and memoizes the key; later calls return it
    /// unchanged whatever `sc` is. Argument order is significant, so
    /// `plus(a, b)` and `plus(b, a)` get different keys even though they are
    /// equivalent.
    pub fn hash_code(&self, sc: &StatementContext) -> &[u8] {
        self.hash_code.get_or_init(|| {
            let mut buf = vec![SCALAR_FUNCTION_FLAG];
            codec::encode_compact_bytes(&mut buf, self.func_name.l.as_bytes());
            for arg in self.args() {
                buf.extend_from_slice(arg.hash_code(sc));
            }
            buf
        })
    }

    /// Same function name and builtins that report themselves equal.
    #[must_use]
    pub fn equal(&self, other: &Expression) -> bool {
        match other {
            Expression::ScalarFunction(fun) => {
                self.func_name.l == fun.func_name.l && self.function.equal(fun.function.as_ref())
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_correlated(&self) -> bool {
        self.args().iter().any(Expression::is_correlated)
    }

    /// False for [`UNFOLDABLE_FUNCTIONS`], otherwise true iff every argument
    /// is constant.
    #[must_use]
    pub fn const_item(&self) -> bool {
        if UNFOLDABLE_FUNCTIONS.contains(&self.func_name.l.as_str()) {
            return false;
        }
        self.args().iter().all(Expression::const_item)
    }

    /// Decorrelates every argument in its own slot.
    ///
    /// This rewrites the receiver in place, unlike
    /// [`ScalarFunction::resolve_indices`]; clone first to keep the original.
    pub fn decorrelate(&mut self, schema: &Schema) -> &mut Self {
        trace!("decorrelating {self}");
        for arg in self.args_mut() {
            arg.decorrelate_in_place(schema);
        }
        self
    }

    /// Returns a clone with every column bound to its offset in `schema`.
    ///
    /// The receiver is never modified: one logical expression may be bound to
    /// several physical layouts.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` with the partially resolved clone.
    pub fn resolve_indices(
        &self,
        schema: &Schema,
    ) -> std::result::Result<Expression, ResolveIndicesError> {
        let mut new_sf = self.clone();
        match new_sf.resolve_indices_in_place(schema) {
            Ok(()) => Ok(new_sf.into()),
            Err(cause) => Err(ResolveIndicesError {
                partial: Box::new(new_sf.into()),
                cause,
            }),
        }
    }

    pub(crate) fn resolve_indices_in_place(&mut self, schema: &Schema) -> Result<()> {
        for arg in self.args_mut() {
            arg.resolve_indices_in_place(schema)?;
        }
        Ok(())
    }
}

impl Clone for ScalarFunction {
    /// Deep copy. The memoized hash key is copied as-is.
    fn clone(&self) -> Self {
        ScalarFunction {
            func_name: self.func_name.clone(),
            ret_type: self.ret_type.clone(),
            function: self.function.clone_box(),
            hash_code: self.hash_code.clone(),
        }
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.func_name.l)
            .field("ret_type", &self.ret_type)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.func_name.l)?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl Serialize for ScalarFunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Converts scalar functions into expressions.
#[must_use]
pub fn scalar_funcs_to_exprs(funcs: Vec<ScalarFunction>) -> Vec<Expression> {
    funcs.into_iter().map(Expression::ScalarFunction).collect()
}
