//! UPDATE SQL generation.

use crate::ast::*;
use crate::error::{FilterError, FilterResult};
use crate::transpiler::Scope;
use crate::transpiler::conditions::where_clause;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::mutation::compile_update;

/// Generate UPDATE SQL.
///
/// SET values are bound before WHERE values so placeholder numbers follow
/// emission order.
pub fn build_update(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let assignments = cmd
        .payload
        .as_ref()
        .map(|p| compile_update(p, scope.generator, ctx))
        .unwrap_or_default();

    if assignments.is_empty() {
        return Err(FilterError::EmptyPayload {
            exec: "update",
            table: cmd.table.clone(),
        });
    }

    let mut sql = String::from("UPDATE ");
    sql.push_str(&cmd.qualified_table());
    sql.push_str(" SET ");
    sql.push_str(&assignments.join(","));
    sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);
    Ok(sql)
}
