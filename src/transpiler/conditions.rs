//! WHERE clause compilation.

use std::fmt;

use crate::ast::*;
use crate::error::{FilterError, FilterResult};
use crate::transpiler::Scope;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::identifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("AND"),
            LogicalOp::Or => f.write_str("OR"),
        }
    }
}

/// Compile a condition list, depth-first and left to right.
///
/// Fragments at one level are joined by `op`; the first carries no leading
/// operator. Returns an empty string when nothing was emitted.
pub fn compile_conditions(
    conditions: &[Condition],
    op: LogicalOp,
    scope: &Scope<'_>,
    ctx: &mut ParamContext,
) -> FilterResult<String> {
    let mut parts: Vec<String> = Vec::with_capacity(conditions.len());
    for cond in conditions {
        if let Some(fragment) = compile_condition(cond, scope, ctx)? {
            parts.push(fragment);
        }
    }
    Ok(parts.join(&format!(" {} ", op)))
}

/// ` WHERE ...` for the top level, or an empty string.
pub fn where_clause(
    conditions: &[Condition],
    scope: &Scope<'_>,
    ctx: &mut ParamContext,
) -> FilterResult<String> {
    let body = compile_conditions(conditions, LogicalOp::And, scope, ctx)?;
    if body.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", body))
    }
}

fn bind_list(values: &[Value], scope: &Scope<'_>, ctx: &mut ParamContext) -> String {
    if values.is_empty() {
        // Still a valid clause, matching nothing.
        return "NULL".to_string();
    }
    values
        .iter()
        .map(|v| ctx.bind(v.clone(), scope.generator))
        .collect::<Vec<_>>()
        .join(",")
}

fn compile_condition(
    cond: &Condition,
    scope: &Scope<'_>,
    ctx: &mut ParamContext,
) -> FilterResult<Option<String>> {
    let col = |name: &str| identifiers::column(scope.cache, scope.language, name, scope.generator);

    let fragment = match cond {
        Condition::Where { name, comparer, value } => {
            let col = col(name);
            let value = value.clone().resolve();
            if value.is_null() {
                if *comparer == Comparer::Eq {
                    format!("{} IS NULL", col)
                } else {
                    format!("{} IS NOT NULL", col)
                }
            } else {
                format!("{}{}{}", col, comparer.as_sql(), ctx.bind(value, scope.generator))
            }
        }
        Condition::In { name, values } => {
            let col = col(name);
            format!("{} IN ({})", col, bind_list(values, scope, ctx))
        }
        Condition::NotIn { name, values } => {
            let col = col(name);
            format!("{} NOT IN ({})", col, bind_list(values, scope, ctx))
        }
        Condition::Between { name, a, b } => {
            let col = col(name);
            let a = ctx.bind(a.clone(), scope.generator);
            let b = ctx.bind(b.clone(), scope.generator);
            format!("{} BETWEEN {} AND {}", col, a, b)
        }
        Condition::Search { name, value, anchor } => {
            let col = col(name);
            let term = value.replace('%', "").to_uppercase();
            let pattern = match anchor {
                SearchAnchor::Begin => format!("{}%", term),
                SearchAnchor::End => format!("%{}", term),
                SearchAnchor::Contains => format!("%{}%", term),
            };
            format!("UPPER({}) LIKE {}", col, ctx.bind(Value::String(pattern), scope.generator))
        }
        Condition::Empty { name } => {
            let col = col(name);
            format!("({} IS NULL OR LENGTH({})=0)", col, col)
        }
        Condition::Contains { name } => format!("LENGTH({})>0", col(name)),
        Condition::DatePart { part, name, comparer, value } => {
            let col = col(name);
            format!(
                "EXTRACT({} FROM {}){}{}",
                part.as_sql(),
                col,
                comparer.as_sql(),
                ctx.bind(value.clone().resolve(), scope.generator)
            )
        }
        Condition::Permit { name, values, required, userid } => {
            let col = col(name);
            let mut alternatives = Vec::new();
            if let Some(id) = userid.as_ref().filter(|id| !id.is_null()) {
                let owner = identifiers::column(scope.cache, scope.language, "userid", scope.generator);
                alternatives.push(format!("{}={}", owner, ctx.bind(id.clone(), scope.generator)));
            }
            if *required {
                alternatives.push(format!("{} IS NULL", col));
            }
            alternatives.push(format!("{} IN ({})", col, bind_list(values, scope, ctx)));
            if alternatives.len() == 1 {
                alternatives.remove(0)
            } else {
                format!("({})", alternatives.join(" OR "))
            }
        }
        Condition::Query(raw) => format!("({})", raw),
        Condition::Or(children) => {
            let inner = compile_conditions(children, LogicalOp::Or, scope, ctx)?;
            if inner.is_empty() {
                return Ok(None);
            }
            format!("({})", inner)
        }
        Condition::Unknown(kind) => {
            if scope.strict {
                return Err(FilterError::UnknownCondition(kind.clone()));
            }
            tracing::debug!("Ignoring unknown condition kind '{}'", kind);
            return Ok(None);
        }
    };

    Ok(Some(fragment))
}
