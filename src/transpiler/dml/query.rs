//! Raw query templates with a compiled WHERE clause.

use crate::ast::*;
use crate::error::{FilterError, FilterResult};
use crate::transpiler::Scope;
use crate::transpiler::conditions::where_clause;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::raw::substitute_where;

/// The caller's positional params are already in `ctx`; WHERE params follow them.
pub fn build_query(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let template = cmd
        .query
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| FilterError::MissingQuery(cmd.table.clone()))?;

    let clause = where_clause(&cmd.conditions, scope, ctx)?;
    Ok(substitute_where(template, &clause))
}
