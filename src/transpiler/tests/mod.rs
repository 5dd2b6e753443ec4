//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT, COUNT, DELETE, scalar and raw query statements
//! - `dialects`: Oracle and PostgreSQL rendering differences
//! - `mutations`: INSERT and UPDATE payloads, RETURNING
//! - `properties`: invariants that hold across descriptors

mod dialects;
mod mutations;

use crate::ast::Value;
use crate::transpiler::Param;

/// Input values of a compiled statement.
fn inputs(params: &[Param]) -> Vec<Value> {
    params.iter().filter_map(Param::as_value).cloned().collect()
}
