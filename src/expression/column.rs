//! Column reference nodes.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::chunk::{Chunk, Column, Row};
use crate::error::{ExprError, Result};
use crate::types::{Datum, FieldType};

use super::{Schema, COLUMN_FLAG, CORRELATED_COLUMN_FLAG};

/// Reference to a column of the row layout the expression is bound to.
///
/// `unique_id` identifies the column logically and is what equality and
/// hashing use; `index` is the physical offset, filled in by
/// [`super::Expression::resolve_indices`]. The id is changed only through
/// [`ExprColumn::set_unique_id`], which drops the memoized hash key.
#[derive(Debug, Clone)]
pub struct ExprColumn {
    unique_id: i64,
    pub index: usize,
    pub ret_type: FieldType,
    pub name: String,
    hash_code: OnceLock<Vec<u8>>,
}

impl ExprColumn {
    /// Creates an unbound column reference.
    #[must_use]
    pub fn new(unique_id: i64, name: impl Into<String>, ret_type: FieldType) -> Self {
        ExprColumn {
            unique_id,
            index: 0,
            ret_type,
            name: name.into(),
            hash_code: OnceLock::new(),
        }
    }

    /// Sets the physical offset.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn unique_id(&self) -> i64 {
        self.unique_id
    }

    /// Rebinds the logical column and invalidates the cached hash key.
    pub fn set_unique_id(&mut self, unique_id: i64) {
        self.unique_id = unique_id;
        self.hash_code.take();
    }

    pub(crate) fn eval(&self, row: &Row<'_>) -> Result<Datum> {
        row.get_datum(self.index, &self.ret_type)
    }

    pub(crate) fn vec_eval(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        result.fill(Arc::clone(input.column(self.index)?))
    }

    pub(crate) fn hash_code(&self) -> &[u8] {
        self.hash_code.get_or_init(|| {
            let mut buf = Vec::with_capacity(9);
            buf.push(COLUMN_FLAG);
            buf.extend_from_slice(&self.unique_id.to_be_bytes());
            buf
        })
    }

    /// Same logical column.
    #[must_use]
    pub fn equal(&self, other: &ExprColumn) -> bool {
        self.unique_id == other.unique_id
    }

    pub(crate) fn resolve_indices(&mut self, schema: &Schema) -> Result<()> {
        self.index = schema
            .column_index(self)
            .ok_or_else(|| ExprError::ColumnNotFound(self.to_string()))?;
        Ok(())
    }
}

impl fmt::Display for ExprColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "Column#{}", self.unique_id)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Reference to a column of an enclosing query.
///
/// The current outer row's value is shared through `data`: clones see the
/// same slot, so the operator driving the outer query can bind a value once
/// for every copy of the inner tree.
#[derive(Debug, Clone)]
pub struct CorrelatedColumn {
    column: ExprColumn,
    data: Arc<RwLock<Datum>>,
    hash_code: OnceLock<Vec<u8>>,
}

impl CorrelatedColumn {
    /// Creates a correlated reference with a NULL value slot.
    #[must_use]
    pub fn new(column: ExprColumn) -> Self {
        CorrelatedColumn {
            column,
            data: Arc::new(RwLock::new(Datum::Null)),
            hash_code: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn column(&self) -> &ExprColumn {
        &self.column
    }

    /// Mutable access to the outer column; drops the cached hash key.
    pub fn column_mut(&mut self) -> &mut ExprColumn {
        self.hash_code.take();
        &mut self.column
    }

    /// Binds the outer row's value.
    pub fn set_value(&self, value: Datum) {
        *self.data.write() = value;
    }

    /// Returns the currently bound value.
    #[must_use]
    pub fn value(&self) -> Datum {
        self.data.read().clone()
    }

    pub(crate) fn vec_eval(&self, input: &Chunk, result: &mut Column) -> Result<()> {
        let array = self
            .data
            .read()
            .broadcast(&self.column.ret_type, input.num_rows())?;
        result.fill(array)
    }

    pub(crate) fn hash_code(&self) -> &[u8] {
        self.hash_code.get_or_init(|| {
            let mut buf = Vec::with_capacity(9);
            buf.push(CORRELATED_COLUMN_FLAG);
            buf.extend_from_slice(&self.column.unique_id.to_be_bytes());
            buf
        })
    }
}

impl fmt::Display for CorrelatedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.column.fmt(f)
    }
}
