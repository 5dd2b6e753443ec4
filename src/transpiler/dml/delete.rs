//! DELETE, DROP and TRUNCATE SQL generation.

use crate::ast::*;
use crate::error::FilterResult;
use crate::transpiler::Scope;
use crate::transpiler::conditions::where_clause;
use crate::transpiler::escape::ParamContext;

/// Generate DELETE SQL.
pub fn build_delete(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&cmd.qualified_table());
    sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);
    Ok(sql)
}

pub fn build_drop(cmd: &FilterCmd) -> String {
    format!("DROP TABLE {}", cmd.qualified_table())
}

pub fn build_truncate(cmd: &FilterCmd) -> String {
    format!("TRUNCATE TABLE {}", cmd.qualified_table())
}
