//! Session and statement settings threaded through expression evaluation.
//!
//! The expression layer never interprets most of these settings itself; they
//! are carried on every builtin so the operator implementations can read them.

use serde::{Deserialize, Serialize};

use crate::chunk::DEFAULT_BATCH_SIZE;

/// SQL mode flag: reject division by zero in strict contexts.
pub const MODE_ERROR_FOR_DIVISION_BY_ZERO: u32 = 1 << 0;
/// SQL mode flag: treat `||` as string concatenation.
pub const MODE_PIPES_AS_CONCAT: u32 = 1 << 1;
/// SQL mode flag: strict handling of out-of-range values.
pub const MODE_STRICT_ALL_TABLES: u32 = 1 << 2;

/// Session-level evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalContext {
    /// Session time zone name.
    pub time_zone: String,
    /// Bit set of `MODE_*` flags.
    pub sql_mode: u32,
    /// Extra scale added to the result of `/`.
    pub div_precision_increment: u8,
    /// Number of rows per batch for vectorized execution.
    pub batch_size: usize,
    /// Statement-scoped settings.
    pub stmt: StatementContext,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            sql_mode: MODE_STRICT_ALL_TABLES,
            div_precision_increment: 4,
            batch_size: DEFAULT_BATCH_SIZE,
            stmt: StatementContext::default(),
        }
    }
}

impl EvalContext {
    /// Creates a context with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session time zone.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Sets the SQL mode flags.
    #[must_use]
    pub fn with_sql_mode(mut self, sql_mode: u32) -> Self {
        self.sql_mode = sql_mode;
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the statement-scoped settings.
    #[must_use]
    pub fn with_statement(mut self, stmt: StatementContext) -> Self {
        self.stmt = stmt;
        self
    }

    /// Returns true if the given `MODE_*` flag is set.
    #[must_use]
    pub fn has_mode(&self, flag: u32) -> bool {
        self.sql_mode & flag != 0
    }
}

/// Statement-scoped settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementContext {
    /// Offset of the statement time zone from UTC, in seconds.
    ///
    /// Time constants are normalized to UTC with this offset before being
    /// hashed, so the same instant written in two zones hashes identically.
    pub time_zone_offset_secs: i32,
    /// Truncation warnings are ignored instead of raised.
    pub ignore_truncate: bool,
}

impl StatementContext {
    /// Creates a statement context with the given time zone offset.
    #[must_use]
    pub fn with_offset(time_zone_offset_secs: i32) -> Self {
        Self {
            time_zone_offset_secs,
            ..Self::default()
        }
    }
}
