//! Row batches and output buffers for expression evaluation.
//!
//! A [`Chunk`] is the unit of vectorized evaluation: a batch of rows stored
//! column by column in Apache Arrow arrays. [`Row`] addresses one row of a
//! chunk for row-at-a-time evaluation, and [`Column`] is the mutable output
//! buffer vectorized evaluators fill in place.

mod column;

use arrow::array::ArrayRef;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{ExprError, Result};
use crate::types::{Datum, FieldType};

pub use column::Column;

/// Default batch size for vectorized execution (rows per batch).
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Batch of rows in columnar layout.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The underlying Arrow RecordBatch.
    batch: RecordBatch,
}

impl Chunk {
    /// Creates a chunk from a RecordBatch.
    #[must_use]
    pub fn new(batch: RecordBatch) -> Self {
        Chunk { batch }
    }

    /// Returns the underlying RecordBatch.
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Returns the schema of this chunk.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Returns the number of rows in this chunk.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns the number of columns in this chunk.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns a column by physical offset.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the offset is out of range.
    pub fn column(&self, index: usize) -> Result<&ArrayRef> {
        if index >= self.batch.num_columns() {
            return Err(ExprError::ColumnNotFound(format!(
                "offset {index} (chunk has {} columns)",
                self.batch.num_columns()
            )));
        }
        Ok(self.batch.column(index))
    }

    /// Returns the row at position `idx`.
    #[must_use]
    pub fn row(&self, idx: usize) -> Row<'_> {
        Row {
            chunk: Some(self),
            idx,
        }
    }

    /// Iterates over all rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.num_rows()).map(move |idx| self.row(idx))
    }
}

/// One row of a chunk.
///
/// The empty row has no backing chunk; it is what constant folding evaluates
/// against, so any column access on it fails.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    chunk: Option<&'a Chunk>,
    idx: usize,
}

impl Row<'static> {
    /// Returns a row with no columns.
    #[must_use]
    pub fn empty() -> Self {
        Row {
            chunk: None,
            idx: 0,
        }
    }
}

impl<'a> Row<'a> {
    /// Returns the position of this row inside its chunk.
    #[must_use]
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Returns the backing chunk, if any.
    #[must_use]
    pub fn chunk(&self) -> Option<&'a Chunk> {
        self.chunk
    }

    /// Reads the value at physical column `col_idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is empty, the column does not exist, or the
    /// column type has no datum representation.
    pub fn get_datum(&self, col_idx: usize, tp: &FieldType) -> Result<Datum> {
        let chunk = self.chunk.ok_or_else(|| {
            ExprError::EvaluationError(format!("column offset {col_idx} read from an empty row"))
        })?;
        let array = chunk.column(col_idx)?;
        if self.idx >= array.len() {
            return Err(ExprError::EvaluationError(format!(
                "row {} out of range for chunk of {} rows",
                self.idx,
                array.len()
            )));
        }
        Datum::from_array(array.as_ref(), self.idx, tp)
    }
}
