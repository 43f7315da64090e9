//! Contract tests for the public expression API.

#[path = "expression_contracts/mod.rs"]
mod expression_contracts;
