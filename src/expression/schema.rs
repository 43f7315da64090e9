//! Physical row layouts expressions are bound against.

use std::collections::HashMap;

use super::ExprColumn;

/// Ordered column slots of a row layout.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ExprColumn>,
    /// unique_id -> offset
    offsets: HashMap<i64, usize>,
}

impl Schema {
    /// Creates a schema from columns in slot order.
    #[must_use]
    pub fn new(columns: Vec<ExprColumn>) -> Self {
        let mut schema = Schema::default();
        for col in columns {
            schema.append(col);
        }
        schema
    }

    /// Adds a column at the next slot. A repeated unique id keeps its first slot.
    pub fn append(&mut self, column: ExprColumn) {
        self.offsets
            .entry(column.unique_id())
            .or_insert(self.columns.len());
        self.columns.push(column);
    }

    /// Returns the slot of `column`, matched by unique id.
    #[must_use]
    pub fn column_index(&self, column: &ExprColumn) -> Option<usize> {
        self.offsets.get(&column.unique_id()).copied()
    }

    /// Checks if the schema has a slot for `column`.
    #[must_use]
    pub fn contains(&self, column: &ExprColumn) -> bool {
        self.offsets.contains_key(&column.unique_id())
    }

    #[must_use]
    pub fn columns(&self) -> &[ExprColumn] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
