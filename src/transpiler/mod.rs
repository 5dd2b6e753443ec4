//! Filter-to-SQL compiler.
//!
//! Turns a [`FilterCmd`] into a [`CompiledStatement`] for one dialect.

pub mod conditions;
pub mod dialect;
pub mod dml;
pub mod escape;
pub mod identifiers;
pub mod mutation;
pub mod raw;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::ast::*;
use crate::cache::{DEFAULT_CLEAR_EVERY, FragmentCache};
use crate::error::{FilterError, FilterResult};

pub use conditions::LogicalOp;
pub use dialect::Dialect;
pub use escape::{BindMode, Param, ParamContext, escape_literal};
pub use traits::SqlGenerator;

/// Read/write classification, used for instrumentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Read,
    Write,
}

/// SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    pub text: String,
    pub params: Vec<Param>,
    pub kind: StatementKind,
    #[serde(skip)]
    pub exec: Exec,
    /// Unquoted names of the RETURNING columns, in order.
    pub returning: Vec<String>,
}

impl CompiledStatement {
    /// Input values in placeholder order, skipping output binds.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.params.iter().filter_map(Param::as_value)
    }

    pub fn has_returning(&self) -> bool {
        !self.returning.is_empty()
    }

    /// At most `max` characters of the text, for log lines.
    pub fn preview(&self, max: usize) -> &str {
        match self.text.char_indices().nth(max) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub bind_mode: BindMode,
    /// Reject unknown condition kinds instead of ignoring them.
    pub strict: bool,
    /// Clear the fragment cache on every Nth maintenance tick. 0 disables.
    pub cache_clear_every: u64,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            bind_mode: BindMode::Parameterized,
            strict: false,
            cache_clear_every: DEFAULT_CLEAR_EVERY,
        }
    }
}

/// Per-compilation view shared by the builders.
pub struct Scope<'a> {
    pub generator: &'a dyn SqlGenerator,
    pub cache: &'a FragmentCache,
    pub language: &'a str,
    pub strict: bool,
}

/// The query assembler. Owns its dialect generator and fragment cache.
///
/// # Example
///
/// ```
/// use qfilter::prelude::*;
///
/// let compiler = Compiler::new(Dialect::Oracle);
/// let cmd = FilterCmd::new("users", Exec::Find)
///     .condition(Condition::compare("age", Comparer::Gt, 30));
/// let stmt = compiler.compile(&cmd).unwrap();
/// assert_eq!(stmt.text, "SELECT * FROM users WHERE \"age\">:1");
/// ```
pub struct Compiler {
    dialect: Dialect,
    generator: Box<dyn SqlGenerator>,
    options: CompilerOptions,
    cache: FragmentCache,
}

impl Compiler {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_options(dialect, CompilerOptions::default())
    }

    pub fn with_options(dialect: Dialect, options: CompilerOptions) -> Self {
        Self {
            dialect,
            generator: dialect.generator(),
            cache: FragmentCache::new(options.cache_clear_every),
            options,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    /// Render a value as an inline literal of this dialect.
    pub fn escape(&self, value: &Value) -> String {
        escape_literal(value, self.generator.as_ref())
    }

    /// Compile the descriptor's own operation. For `list` this is the data statement.
    pub fn compile(&self, cmd: &FilterCmd) -> FilterResult<CompiledStatement> {
        self.compile_as(cmd, cmd.exec)
    }

    /// Data and count statements of a `list`, sharing one WHERE clause.
    pub fn compile_list(&self, cmd: &FilterCmd) -> FilterResult<(CompiledStatement, CompiledStatement)> {
        let data = self.compile_as(cmd, Exec::List)?;
        let count = self.compile_as(cmd, Exec::Count)?;
        Ok((data, count))
    }

    /// Compile the descriptor as if its operation were `exec`.
    pub fn compile_as(&self, cmd: &FilterCmd, exec: Exec) -> FilterResult<CompiledStatement> {
        if cmd.table.trim().is_empty() && exec != Exec::Query {
            return Err(FilterError::invalid("table name is empty"));
        }

        let scope = Scope {
            generator: self.generator.as_ref(),
            cache: &self.cache,
            language: cmd.language_code(),
            strict: self.options.strict,
        };
        let mode = self.options.bind_mode;

        let mut ctx = if exec == Exec::Query {
            if mode == BindMode::Inline && !cmd.params.is_empty() {
                return Err(FilterError::InlineParams(cmd.params.len()));
            }
            ParamContext::with_params(mode, &cmd.params)
        } else {
            ParamContext::new(mode)
        };

        let mut text = match exec {
            Exec::Find | Exec::Read | Exec::List => dml::select::build_select(cmd, &scope, &mut ctx)?,
            Exec::Count | Exec::Check => dml::select::build_count(cmd, &scope, &mut ctx)?,
            Exec::Insert => dml::insert::build_insert(cmd, &scope, &mut ctx)?,
            Exec::Update => dml::update::build_update(cmd, &scope, &mut ctx)?,
            Exec::Remove => dml::delete::build_delete(cmd, &scope, &mut ctx)?,
            Exec::Drop => dml::delete::build_drop(cmd),
            Exec::Truncate => dml::delete::build_truncate(cmd),
            Exec::Scalar => dml::scalar::build_scalar(cmd, &scope, &mut ctx)?,
            Exec::Query => dml::query::build_query(cmd, &scope, &mut ctx)?,
        };

        if exec.is_paged() {
            text.push_str(&dml::select::build_order_and_page(cmd, &scope));
        }

        let returning = match exec {
            Exec::Insert | Exec::Update | Exec::Remove => cmd.returning_columns(),
            _ => Vec::new(),
        };
        if !returning.is_empty() {
            text.push_str(&Self::build_returning(&returning, &scope, &mut ctx));
        }

        let kind = match exec {
            Exec::Find | Exec::Read | Exec::List | Exec::Count | Exec::Check | Exec::Scalar => {
                StatementKind::Read
            }
            Exec::Query if !raw::is_write_statement(&text) => StatementKind::Read,
            _ => StatementKind::Write,
        };

        let stmt = CompiledStatement {
            text,
            params: ctx.params,
            kind,
            exec,
            returning,
        };

        if cmd.debug {
            tracing::info!(sql = %stmt.text, params = ?stmt.params, "compiled {}", exec);
        } else {
            tracing::trace!(sql = %stmt.text, "compiled {}", exec);
        }

        Ok(stmt)
    }

    /// Output binds are allocated after every input bind.
    fn build_returning(columns: &[String], scope: &Scope<'_>, ctx: &mut ParamContext) -> String {
        let quoted: Vec<String> = columns
            .iter()
            .map(|c| identifiers::column(scope.cache, scope.language, c, scope.generator).to_string())
            .collect();

        let outs: Vec<String> = if scope.generator.returning_binds_out() {
            columns
                .iter()
                .map(|c| ctx.bind_out(c, scope.generator))
                .collect()
        } else {
            Vec::new()
        };

        scope.generator.returning(&quoted, &outs)
    }
}
