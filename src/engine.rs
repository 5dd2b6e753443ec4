//! Execution engine for qfilter.
//!
//! The engine compiles a descriptor, hands each statement to an [`Executor`]
//! and shapes the response. It never opens or closes connections itself: the
//! executor owns them, and dropping it releases them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::types::{Json, Uuid};
use sqlx::{Column, Row, TypeInfo};

use crate::ast::values::format_datetime;
use crate::ast::{Exec, FilterCmd, Value};
use crate::error::{FilterError, FilterResult};
use crate::mapper::{self, ExecResult, Output};
use crate::transpiler::{CompiledStatement, Compiler, Param, StatementKind};

/// Runs one compiled statement against the database.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, statement: &CompiledStatement) -> FilterResult<ExecResult>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, statement: &CompiledStatement) -> FilterResult<ExecResult> {
        (**self).execute(statement).await
    }
}

/// Called with every execution error before it reaches the caller.
pub type ErrorHook = Arc<dyn Fn(&FilterError, &CompiledStatement) + Send + Sync>;

/// Hook that logs the error with the first 100 characters of the statement.
pub fn logging_hook() -> ErrorHook {
    Arc::new(|err: &FilterError, stmt: &CompiledStatement| {
        tracing::error!("{} - {}", err, stmt.preview(100));
    })
}

/// Read/write statement counters.
#[derive(Debug, Default)]
pub struct EngineStats {
    reads: AtomicU64,
    writes: AtomicU64,
}

impl EngineStats {
    fn record(&self, kind: StatementKind) {
        match kind {
            StatementKind::Read => self.reads.fetch_add(1, Ordering::Relaxed),
            StatementKind::Write => self.writes.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

/// Compiles, executes and shapes descriptors.
pub struct Engine<E> {
    executor: E,
    compiler: Arc<Compiler>,
    error_hook: Option<ErrorHook>,
    stats: EngineStats,
}

impl<E: Executor> Engine<E> {
    pub fn new(executor: E, compiler: Arc<Compiler>) -> Self {
        Self {
            executor,
            compiler,
            error_hook: None,
            stats: EngineStats::default(),
        }
    }

    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Maintenance tick, forwarded to the fragment cache.
    pub fn tick(&self, counter: u64) -> bool {
        self.compiler.cache().tick(counter)
    }

    /// Run one descriptor end to end.
    ///
    /// Compile errors surface before anything is executed. For `list`, both
    /// statements are compiled first and then executed concurrently; the
    /// operation fails if either fails.
    pub async fn exec(&self, cmd: &FilterCmd) -> FilterResult<Output> {
        if cmd.exec == Exec::List {
            let (data, count) = self.compiler.compile_list(cmd)?;
            let (data, count) = tokio::try_join!(self.run(&data), self.run(&count))?;
            return Ok(mapper::map_list(data, count));
        }

        let stmt = self.compiler.compile(cmd)?;
        let result = self.run(&stmt).await?;
        Ok(mapper::map_result(cmd, stmt.exec, result))
    }

    async fn run(&self, stmt: &CompiledStatement) -> FilterResult<ExecResult> {
        self.stats.record(stmt.kind);
        match self.executor.execute(stmt).await {
            Ok(result) => Ok(result),
            Err(err) => {
                self.report(&err, stmt);
                Err(err)
            }
        }
    }

    fn report(&self, err: &FilterError, stmt: &CompiledStatement) {
        let Some(hook) = &self.error_hook else {
            return;
        };
        // A failing hook must not replace the original error.
        if catch_unwind(AssertUnwindSafe(|| hook(err, stmt))).is_err() {
            tracing::warn!("error hook panicked while reporting: {}", err);
        }
    }
}

/// [`Executor`] over a sqlx `PgPool`. Pair it with the Postgres dialect.
///
/// Each statement checks a connection out of the pool and returns it when the
/// query future completes or is dropped.
#[derive(Clone)]
pub struct SqlxExecutor {
    pool: PgPool,
}

impl SqlxExecutor {
    /// Connect to a database using a connection URL.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let executor = SqlxExecutor::connect("postgres://localhost/mydb").await?;
    /// ```
    pub async fn connect(url: &str) -> FilterResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| FilterError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Native PostgreSQL argument for a bound [`Value`].
#[derive(Debug, Clone, PartialEq)]
enum PgArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    TextArray(Vec<String>),
}

impl From<&Value> for PgArg {
    fn from(value: &Value) -> Self {
        match value.clone().resolve() {
            Value::Null => PgArg::Null,
            Value::Bool(v) => PgArg::Bool(v),
            Value::Int(v) => PgArg::Int(v),
            Value::Float(v) => PgArg::Float(v),
            Value::String(v) => PgArg::Text(v),
            Value::DateTime(v) => PgArg::Timestamp(v),
            Value::Json(v) => PgArg::Json(v),
            Value::Array(items) => array_arg(&items),
            // `resolve` never yields another `Lazy`.
            Value::Lazy(_) => PgArg::Null,
        }
    }
}

/// Homogeneous scalar arrays bind as PostgreSQL arrays, anything else as JSON.
fn array_arg(items: &[Value]) -> PgArg {
    let items: Vec<Value> = items.iter().cloned().map(Value::resolve).collect();
    if let Some(v) = collect_all(&items, |i| match i {
        Value::Bool(b) => Some(*b),
        _ => None,
    }) {
        return PgArg::BoolArray(v);
    }
    if let Some(v) = collect_all(&items, |i| match i {
        Value::Int(n) => Some(*n),
        _ => None,
    }) {
        return PgArg::IntArray(v);
    }
    if let Some(v) = collect_all(&items, |i| match i {
        Value::Float(f) => Some(*f),
        Value::Int(n) => Some(*n as f64),
        _ => None,
    }) {
        return PgArg::FloatArray(v);
    }
    if let Some(v) = collect_all(&items, |i| match i {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }) {
        return PgArg::TextArray(v);
    }
    PgArg::Json(Value::Array(items).to_json())
}

fn collect_all<T>(items: &[Value], f: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        return None;
    }
    items.iter().map(f).collect()
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match PgArg::from(value) {
        PgArg::Null => query.bind(Option::<String>::None),
        PgArg::Bool(v) => query.bind(v),
        PgArg::Int(v) => query.bind(v),
        PgArg::Float(v) => query.bind(v),
        PgArg::Text(v) => query.bind(v),
        PgArg::Timestamp(v) => query.bind(v),
        PgArg::Json(v) => query.bind(Json(v)),
        PgArg::BoolArray(v) => query.bind(v),
        PgArg::IntArray(v) => query.bind(v),
        PgArg::FloatArray(v) => query.bind(v),
        PgArg::TextArray(v) => query.bind(v),
    }
}

#[async_trait]
impl Executor for SqlxExecutor {
    async fn execute(&self, statement: &CompiledStatement) -> FilterResult<ExecResult> {
        if statement.params.iter().any(|p| matches!(p, Param::Out { .. })) {
            return Err(FilterError::Execution(
                "output binds are not supported by the sqlx executor".to_string(),
            ));
        }

        let mut query = sqlx::query(&statement.text);
        for value in statement.values() {
            query = bind_value(query, value);
        }

        if statement.kind == StatementKind::Read || statement.has_returning() {
            let rows: Vec<PgRow> = query.fetch_all(&self.pool).await?;
            return Ok(ExecResult::rows(rows.iter().map(row_to_map).collect()));
        }

        let result = query.execute(&self.pool).await?;
        Ok(ExecResult::affected(result.rows_affected()))
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Integral NUMERICs that fit come back as integers, the rest as floats.
fn decimal_json(d: Decimal) -> serde_json::Value {
    if d.fract().is_zero() {
        if let Some(n) = d.to_i64() {
            return serde_json::Value::from(n);
        }
    }
    d.to_f64().map(float_json).unwrap_or(serde_json::Value::Null)
}

fn get<'r, T>(row: &'r PgRow, i: usize) -> Option<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(i).ok().flatten()
}

/// Convert a PgRow to a HashMap.
fn row_to_map(row: &PgRow) -> mapper::Row {
    let mut map = mapper::Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let type_name = column.type_info().name();

        let value: Option<serde_json::Value> = match type_name {
            "BOOL" => get::<bool>(row, i).map(serde_json::Value::Bool),
            "INT2" => get::<i16>(row, i).map(serde_json::Value::from),
            "INT4" => get::<i32>(row, i).map(serde_json::Value::from),
            "INT8" => get::<i64>(row, i).map(serde_json::Value::from),
            "FLOAT4" => get::<f32>(row, i).map(|v| float_json(f64::from(v))),
            "FLOAT8" => get::<f64>(row, i).map(float_json),
            "NUMERIC" => get::<Decimal>(row, i).map(decimal_json),
            "TIMESTAMP" => get::<NaiveDateTime>(row, i)
                .map(|v| serde_json::Value::String(format_datetime(&v))),
            "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, i)
                .map(|v| serde_json::Value::String(format_datetime(&v.naive_utc()))),
            "DATE" => get::<NaiveDate>(row, i)
                .map(|v| serde_json::Value::String(v.format("%Y-%m-%d").to_string())),
            "JSON" | "JSONB" => get::<serde_json::Value>(row, i),
            "UUID" => get::<Uuid>(row, i).map(|v| serde_json::Value::String(v.to_string())),
            _ => get::<String>(row, i).map(serde_json::Value::String),
        };

        map.insert(name, value.unwrap_or(serde_json::Value::Null));
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LazyValue;
    use serde_json::json;

    #[test]
    fn test_scalars_bind_natively() {
        assert_eq!(PgArg::from(&Value::Null), PgArg::Null);
        assert_eq!(PgArg::from(&Value::Bool(true)), PgArg::Bool(true));
        assert_eq!(PgArg::from(&Value::Int(7)), PgArg::Int(7));
        assert_eq!(PgArg::from(&Value::from("x")), PgArg::Text("x".to_string()));
    }

    #[test]
    fn test_datetime_binds_as_timestamp() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(PgArg::from(&Value::DateTime(dt)), PgArg::Timestamp(dt));
    }

    #[test]
    fn test_json_binds_as_json() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(PgArg::from(&Value::Json(doc.clone())), PgArg::Json(doc));
    }

    #[test]
    fn test_arrays_bind_by_element_type() {
        let ints = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(PgArg::from(&ints), PgArg::IntArray(vec![1, 2]));

        let floats = Value::Array(vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(PgArg::from(&floats), PgArg::FloatArray(vec![1.0, 2.5]));

        let texts = Value::Array(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(
            PgArg::from(&texts),
            PgArg::TextArray(vec!["a".to_string(), "b".to_string()])
        );

        let mixed = Value::Array(vec![Value::Int(1), Value::from("b"), Value::Null]);
        assert_eq!(PgArg::from(&mixed), PgArg::Json(json!([1, "b", null])));

        assert_eq!(PgArg::from(&Value::Array(vec![])), PgArg::Json(json!([])));
    }

    #[test]
    fn test_lazy_binds_resolved() {
        let lazy = Value::Lazy(LazyValue::new(|| Value::Int(3)));
        assert_eq!(PgArg::from(&lazy), PgArg::Int(3));
        let nested = Value::Array(vec![Value::Lazy(LazyValue::new(|| Value::Bool(false)))]);
        assert_eq!(PgArg::from(&nested), PgArg::BoolArray(vec![false]));
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(decimal_json(Decimal::new(1200, 2)), json!(12));
        assert_eq!(decimal_json(Decimal::new(1250, 2)), json!(12.5));
        assert!(decimal_json(Decimal::MAX).is_f64());
        assert_eq!(float_json(f64::NAN), serde_json::Value::Null);
    }
}
