//! Literal escaping and parameter binding.

use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::ast::values::format_datetime;
use crate::transpiler::traits::SqlGenerator;

/// How values reach the statement. One mode per statement, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Numbered placeholders plus an ordered parameter list.
    #[default]
    Parameterized,
    /// Values escaped into the text. Compatibility mode for legacy templates.
    Inline,
}

/// One bound parameter of a compiled statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    /// Input value.
    In(Value),
    /// Output bind receiving a RETURNING column.
    Out { column: String },
}

impl Param {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Param::In(v) => Some(v),
            Param::Out { .. } => None,
        }
    }
}

/// Render a value as an inline SQL literal.
pub fn escape_literal(value: &Value, generator: &dyn SqlGenerator) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| escape_literal(v, generator))
            .collect::<Vec<_>>()
            .join(","),
        Value::Lazy(lazy) => match lazy.eval() {
            Value::Lazy(_) => "NULL".to_string(),
            v => escape_literal(&v, generator),
        },
        Value::Bool(b) => generator.bool_literal(*b),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => quote_string(s),
        Value::DateTime(dt) => generator.date_literal(&quote_string(&format_datetime(dt))),
        Value::Json(json) => quote_string(&json.to_string()),
    }
}

/// Single-quote a string, doubling embedded quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Inverse of [`quote_string`].
pub fn unquote_string(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Context for building one statement's values.
///
/// Placeholders are allocated strictly in emission order, so placeholder N
/// always refers to `params[N - 1]`.
#[derive(Debug)]
pub struct ParamContext {
    pub mode: BindMode,
    pub params: Vec<Param>,
}

impl ParamContext {
    pub fn new(mode: BindMode) -> Self {
        Self {
            mode,
            params: Vec::new(),
        }
    }

    /// Seed with caller-supplied positional values; they occupy placeholders `1..=k`.
    pub fn with_params(mode: BindMode, params: &[Value]) -> Self {
        Self {
            mode,
            params: params.iter().cloned().map(|v| Param::In(v.resolve())).collect(),
        }
    }

    /// Bind a value and return the SQL that refers to it.
    pub fn bind(&mut self, value: Value, generator: &dyn SqlGenerator) -> String {
        match self.mode {
            BindMode::Parameterized => {
                self.params.push(Param::In(value.resolve()));
                generator.placeholder(self.params.len())
            }
            BindMode::Inline => escape_literal(&value, generator),
        }
    }

    /// Allocate an output bind after every input bind.
    pub fn bind_out(&mut self, column: &str, generator: &dyn SqlGenerator) -> String {
        self.params.push(Param::Out {
            column: column.to_string(),
        });
        generator.placeholder(self.params.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LazyValue;
    use crate::transpiler::Dialect;
    use chrono::NaiveDate;

    fn oracle(v: Value) -> String {
        escape_literal(&v, Dialect::Oracle.generator().as_ref())
    }

    #[test]
    fn test_escape_scalars() {
        assert_eq!(oracle(Value::Null), "NULL");
        assert_eq!(oracle(Value::Bool(true)), "1");
        assert_eq!(oracle(Value::Int(42)), "42");
        assert_eq!(oracle(Value::Float(2.5)), "2.5");
        assert_eq!(oracle(Value::from("O'Brien")), "'O''Brien'");
    }

    #[test]
    fn test_escape_array_and_lazy() {
        assert_eq!(oracle(Value::from(vec![1, 2, 3])), "1,2,3");
        assert_eq!(oracle(Value::Lazy(LazyValue::new(|| Value::from("x")))), "'x'");
    }

    #[test]
    fn test_escape_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(
            oracle(Value::DateTime(dt)),
            "TO_DATE('2024-03-07 09:05:00', 'YYYY-MM-DD HH24:MI:SS')"
        );
        assert_eq!(
            escape_literal(&Value::DateTime(dt), Dialect::Postgres.generator().as_ref()),
            "TIMESTAMP '2024-03-07 09:05:00'"
        );
    }

    #[test]
    fn test_escape_composite_as_json_string() {
        let v = Value::Json(serde_json::json!({"a": "it's"}));
        assert_eq!(oracle(v), r#"'{"a":"it''s"}'"#);
    }

    #[test]
    fn test_quote_round_trip() {
        for s in ["plain", "it's", "''", "a'b'c"] {
            assert_eq!(unquote_string(&quote_string(s)).as_deref(), Some(s));
        }
    }

    #[test]
    fn test_param_context_numbering() {
        let generator = Dialect::Oracle.generator();
        let mut ctx = ParamContext::with_params(BindMode::Parameterized, &[Value::Int(1)]);
        assert_eq!(ctx.bind(Value::Int(2), generator.as_ref()), ":2");
        assert_eq!(ctx.bind_out("id", generator.as_ref()), ":3");
        assert_eq!(ctx.params.len(), 3);
    }

    #[test]
    fn test_inline_mode_binds_nothing() {
        let generator = Dialect::Oracle.generator();
        let mut ctx = ParamContext::new(BindMode::Inline);
        assert_eq!(ctx.bind(Value::from("a"), generator.as_ref()), "'a'");
        assert!(ctx.params.is_empty());
    }
}
