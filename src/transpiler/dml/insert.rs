//! INSERT SQL generation.

use crate::ast::*;
use crate::error::{FilterError, FilterResult};
use crate::transpiler::Scope;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::mutation::compile_insert;

/// Generate INSERT SQL. RETURNING is appended by the caller.
pub fn build_insert(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let parts = cmd
        .payload
        .as_ref()
        .map(|p| compile_insert(p, scope.generator, ctx))
        .unwrap_or_default();

    if parts.columns.is_empty() {
        return Err(FilterError::EmptyPayload {
            exec: "insert",
            table: cmd.table.clone(),
        });
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        cmd.qualified_table(),
        parts.columns.join(","),
        parts.values.join(",")
    ))
}
