//! SELECT SQL generation: find/read/list data and count/check.

use crate::ast::*;
use crate::error::FilterResult;
use crate::transpiler::Scope;
use crate::transpiler::conditions::where_clause;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::identifiers;

/// `SELECT <fields or *> FROM <table> [WHERE ...]`. Sort and paging are added by the caller.
pub fn build_select(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let mut sql = String::from("SELECT ");

    match &cmd.fields {
        Some(fields) if !fields.is_empty() => {
            sql.push_str(&identifiers::field_list(scope.cache, scope.language, fields, scope.generator));
        }
        _ => sql.push('*'),
    }

    sql.push_str(" FROM ");
    sql.push_str(&cmd.qualified_table());
    sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);

    Ok(sql)
}

/// `SELECT COUNT(1) AS COUNT FROM <table> [WHERE ...]`. Shared by count, check and
/// the second statement of a list.
pub fn build_count(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let mut sql = String::from("SELECT COUNT(1) AS COUNT FROM ");
    sql.push_str(&cmd.qualified_table());
    sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);
    Ok(sql)
}

/// ` ORDER BY ...` plus the dialect's pagination suffix.
pub fn build_order_and_page(cmd: &FilterCmd, scope: &Scope<'_>) -> String {
    let mut sql = String::new();

    if let Some(sort) = cmd.sort.as_ref().filter(|s| !s.is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(&identifiers::sort_list(scope.cache, scope.language, sort, scope.generator));
    }

    sql.push_str(&scope.generator.limit_offset(
        cmd.take.filter(|n| *n > 0),
        cmd.skip.filter(|n| *n > 0),
    ));
    sql
}
