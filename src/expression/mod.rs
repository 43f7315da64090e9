//! Expression trees.
//!
//! An [`Expression`] is one of a closed set of node kinds:
//! - [`ExprColumn`]: reference to a column of the current row layout
//! - [`CorrelatedColumn`]: reference to a column of an enclosing query
//! - [`Constant`]: literal value
//! - [`ScalarFunction`]: call of a builtin over argument expressions
//!
//! Trees are built and rewritten during single-threaded planning and are
//! read-only during execution, where they may be evaluated from several
//! threads at once.

mod column;
mod constant;
mod folder;
mod scalar_function;
mod schema;

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::chunk::{Chunk, Column, Row};
use crate::context::StatementContext;
use crate::error::{ExprError, Result};
use crate::types::{Datum, EvalType, FieldType};

pub use column::{CorrelatedColumn, ExprColumn};
pub use constant::Constant;
pub use folder::fold_constant;
pub use scalar_function::{scalar_funcs_to_exprs, ScalarFunction, UNFOLDABLE_FUNCTIONS};
pub use schema::Schema;

/// Hash key tag of a constant node.
pub const CONSTANT_FLAG: u8 = 0;
/// Hash key tag of a column node.
pub const COLUMN_FLAG: u8 = 1;
/// Hash key tag of a correlated column node.
pub const CORRELATED_COLUMN_FLAG: u8 = 2;
/// Hash key tag of a scalar function node.
pub const SCALAR_FUNCTION_FLAG: u8 = 3;

/// Node of a value-producing expression tree.
#[derive(Debug, Clone)]
pub enum Expression {
    Column(ExprColumn),
    CorrelatedColumn(CorrelatedColumn),
    Constant(Constant),
    ScalarFunction(ScalarFunction),
}

/// Failure of [`Expression::resolve_indices`].
///
/// `partial` is the clone as far as resolution got before `cause`; it is
/// returned for inspection only and must not be used as a resolved tree.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ResolveIndicesError {
    pub partial: Box<Expression>,
    #[source]
    pub cause: ExprError,
}

impl From<ResolveIndicesError> for ExprError {
    fn from(err: ResolveIndicesError) -> Self {
        err.cause
    }
}

macro_rules! dispatch_vec_eval {
    ($self:ident, $input:ident, $result:ident, $method:ident) => {
        match $self {
            Expression::Column(col) => col.vec_eval($input, $result),
            Expression::CorrelatedColumn(col) => col.vec_eval($input, $result),
            Expression::Constant(con) => con.vec_eval($input, $result),
            Expression::ScalarFunction(sf) => sf.$method($input, $result),
        }
    };
}

impl Expression {
    /// Returns the result type of this expression.
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        match self {
            Expression::Column(col) => &col.ret_type,
            Expression::CorrelatedColumn(col) => &col.column().ret_type,
            Expression::Constant(con) => &con.ret_type,
            Expression::ScalarFunction(sf) => sf.ret_type(),
        }
    }

    /// Evaluates one row into a generic value.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors of the node.
    pub fn eval(&self, row: &Row<'_>) -> Result<Datum> {
        match self {
            Expression::Column(col) => col.eval(row),
            Expression::CorrelatedColumn(col) => Ok(col.value()),
            Expression::Constant(con) => Ok(con.value().clone()),
            Expression::ScalarFunction(sf) => sf.eval(row),
        }
    }

    /// Evaluates one row as an integer.
    ///
    /// # Errors
    ///
    /// Propagates evaluation and type errors.
    pub fn eval_int(&self, row: &Row<'_>) -> Result<Option<i64>> {
        match self {
            Expression::ScalarFunction(sf) => sf.eval_int(row),
            leaf => leaf.eval(row)?.to_eval_int(),
        }
    }

    /// Evaluates one row as a float.
    ///
    /// # Errors
    ///
    /// Propagates evaluation and type errors.
    pub fn eval_real(&self, row: &Row<'_>) -> Result<Option<f64>> {
        match self {
            Expression::ScalarFunction(sf) => sf.eval_real(row),
            leaf => leaf.eval(row)?.to_eval_real(),
        }
    }

    /// Evaluates one row as a string.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn eval_string(&self, row: &Row<'_>) -> Result<Option<String>> {
        match self {
            Expression::ScalarFunction(sf) => sf.eval_string(row),
            leaf => Ok(leaf.eval(row)?.to_eval_string()),
        }
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_int(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_int)
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_real(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_real)
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_string(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_string)
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_decimal(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_decimal)
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_time(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_time)
    }

    /// # Errors
    ///
    /// Propagates the node's evaluation error.
    pub fn vec_eval_duration(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        dispatch_vec_eval!(self, input, result, vec_eval_duration)
    }

    /// Evaluates a whole chunk into `result`, picking the evaluator from the
    /// category of the buffer.
    ///
    /// # Errors
    ///
    /// Propagates the first evaluation error; `result` is then unspecified.
    pub fn vec_eval(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        match result.eval_type() {
            EvalType::Int => self.vec_eval_int(input, result),
            EvalType::Real => self.vec_eval_real(input, result),
            EvalType::String => self.vec_eval_string(input, result),
            EvalType::Decimal => self.vec_eval_decimal(input, result),
            EvalType::Datetime => self.vec_eval_time(input, result),
            EvalType::Duration => self.vec_eval_duration(input, result),
        }
    }

    /// Returns true if the whole subtree supports vectorized evaluation.
    #[must_use]
    pub fn vectorized(&self) -> bool {
        match self {
            Expression::ScalarFunction(sf) => sf.vectorized(),
            _ => true,
        }
    }

    /// Returns the structural hash key of this subtree.
    ///
    /// Keys are memoized per node; see [`ScalarFunction::hash_code`].
    pub fn hash_code(&self, sc: &StatementContext) -> &[u8] {
        match self {
            Expression::Column(col) => col.hash_code(),
            Expression::CorrelatedColumn(col) => col.hash_code(),
            Expression::Constant(con) => con.hash_code(sc),
            Expression::ScalarFunction(sf) => sf.hash_code(sc),
        }
    }

    /// Structural equality.
    #[must_use]
    pub fn equal(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::Column(a), Expression::Column(b)) => a.equal(b),
            (Expression::CorrelatedColumn(a), Expression::CorrelatedColumn(b)) => {
                a.column().equal(b.column())
            }
            (Expression::Constant(a), Expression::Constant(b)) => a.equal(b),
            (Expression::ScalarFunction(sf), _) => sf.equal(other),
            _ => false,
        }
    }

    /// Returns true if the subtree reads a column of an enclosing query.
    #[must_use]
    pub fn is_correlated(&self) -> bool {
        match self {
            Expression::Column(_) | Expression::Constant(_) => false,
            Expression::CorrelatedColumn(_) => true,
            Expression::ScalarFunction(sf) => sf.is_correlated(),
        }
    }

    /// Returns true if the subtree evaluates to the same value for every row
    /// and may be folded.
    #[must_use]
    pub fn const_item(&self) -> bool {
        match self {
            Expression::Column(_) | Expression::CorrelatedColumn(_) => false,
            Expression::Constant(_) => true,
            Expression::ScalarFunction(sf) => sf.const_item(),
        }
    }

    /// Replaces correlated columns found in `schema` with plain columns.
    ///
    /// Scalar functions are rewritten in place; clone the tree first if the
    /// original must be kept.
    #[must_use]
    pub fn decorrelate(mut self, schema: &Schema) -> Expression {
        self.decorrelate_in_place(schema);
        self
    }

    pub(crate) fn decorrelate_in_place(&mut self, schema: &Schema) {
        match self {
            Expression::CorrelatedColumn(col) if schema.contains(col.column()) => {
                *self = Expression::Column(col.column().clone());
            }
            Expression::ScalarFunction(sf) => {
                sf.decorrelate(schema);
            }
            _ => {}
        }
    }

    /// Returns a copy of the subtree with every column bound to its offset in
    /// `schema`. The receiver is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` together with the partially resolved copy.
    pub fn resolve_indices(&self, schema: &Schema) -> std::result::Result<Expression, ResolveIndicesError> {
        if let Expression::ScalarFunction(sf) = self {
            return sf.resolve_indices(schema);
        }
        let mut resolved = self.clone();
        match resolved.resolve_indices_in_place(schema) {
            Ok(()) => Ok(resolved),
            Err(cause) => Err(ResolveIndicesError {
                partial: Box::new(resolved),
                cause,
            }),
        }
    }

    pub(crate) fn resolve_indices_in_place(&mut self, schema: &Schema) -> Result<()> {
        match self {
            Expression::Column(col) => col.resolve_indices(schema),
            Expression::CorrelatedColumn(_) | Expression::Constant(_) => Ok(()),
            Expression::ScalarFunction(sf) => sf.resolve_indices_in_place(schema),
        }
    }

    #[must_use]
    pub fn as_scalar_function(&self) -> Option<&ScalarFunction> {
        match self {
            Expression::ScalarFunction(sf) => Some(sf),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(con) => Some(con),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_column(&self) -> Option<&ExprColumn> {
        match self {
            Expression::Column(col) => Some(col),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(col) => col.fmt(f),
            Expression::CorrelatedColumn(col) => col.fmt(f),
            Expression::Constant(con) => con.fmt(f),
            Expression::ScalarFunction(sf) => sf.fmt(f),
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<ExprColumn> for Expression {
    fn from(col: ExprColumn) -> Self {
        Expression::Column(col)
    }
}

impl From<CorrelatedColumn> for Expression {
    fn from(col: CorrelatedColumn) -> Self {
        Expression::CorrelatedColumn(col)
    }
}

impl From<Constant> for Expression {
    fn from(con: Constant) -> Self {
        Expression::Constant(con)
    }
}

impl From<ScalarFunction> for Expression {
    fn from(sf: ScalarFunction) -> Self {
        Expression::ScalarFunction(sf)
    }
}
