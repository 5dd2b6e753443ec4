//! Aggregate SQL generation.

use crate::ast::*;
use crate::error::{FilterError, FilterResult};
use crate::transpiler::Scope;
use crate::transpiler::conditions::where_clause;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::identifiers;

/// `SELECT AGG(key) AS VALUE ...` or, for `group`,
/// `SELECT key, SUM(key2) AS VALUE ... GROUP BY key`.
pub fn build_scalar(cmd: &FilterCmd, scope: &Scope<'_>, ctx: &mut ParamContext) -> FilterResult<String> {
    let spec = cmd
        .scalar
        .as_ref()
        .ok_or_else(|| FilterError::MissingScalar(cmd.table.clone()))?;
    let col = |name: &str| identifiers::column(scope.cache, scope.language, name, scope.generator);
    let key = spec.key.as_deref().filter(|k| !k.is_empty());
    let key2 = spec.key2.as_deref().filter(|k| !k.is_empty());

    let mut sql = String::from("SELECT ");
    match spec.kind {
        ScalarType::Group => {
            let key = key.ok_or_else(|| {
                FilterError::UnsupportedScalar("group requires a key".to_string())
            })?;
            let key = col(key);
            let value = match key2 {
                Some(k2) => format!("SUM({})", col(k2)),
                None => "COUNT(1)".to_string(),
            };
            sql.push_str(&format!("{}, {} AS VALUE FROM {}", key, value, cmd.qualified_table()));
            sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);
            sql.push_str(&format!(" GROUP BY {}", key));
        }
        kind => {
            if key2.is_some() {
                return Err(FilterError::UnsupportedScalar(format!(
                    "key2 is only valid with group, not {}",
                    kind.as_sql().to_lowercase()
                )));
            }
            let arg = match key {
                None | Some("*") => "1".to_string(),
                Some(k) => col(k).to_string(),
            };
            sql.push_str(&format!("{}({}) AS VALUE FROM {}", kind.as_sql(), arg, cmd.qualified_table()));
            sql.push_str(&where_clause(&cmd.conditions, scope, ctx)?);
        }
    }

    Ok(sql)
}
