use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Condition, Payload, Value};

/// Operation kind of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exec {
    #[default]
    Find,
    Read,
    List,
    Count,
    Check,
    Insert,
    Update,
    Remove,
    Drop,
    Truncate,
    Scalar,
    Query,
}

impl Exec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exec::Find => "find",
            Exec::Read => "read",
            Exec::List => "list",
            Exec::Count => "count",
            Exec::Check => "check",
            Exec::Insert => "insert",
            Exec::Update => "update",
            Exec::Remove => "remove",
            Exec::Drop => "drop",
            Exec::Truncate => "truncate",
            Exec::Scalar => "scalar",
            Exec::Query => "query",
        }
    }

    /// Whether ORDER BY and pagination apply.
    pub fn is_paged(&self) -> bool {
        matches!(self, Exec::Find | Exec::Read | Exec::List | Exec::Query)
    }
}

impl fmt::Display for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Avg,
    Min,
    Max,
    Sum,
    Count,
    Group,
}

impl ScalarType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ScalarType::Avg => "AVG",
            ScalarType::Min => "MIN",
            ScalarType::Max => "MAX",
            ScalarType::Sum => "SUM",
            ScalarType::Count => "COUNT",
            ScalarType::Group => "GROUP",
        }
    }
}

/// Aggregate request: a single value, or a value per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSpec {
    #[serde(rename = "type")]
    pub kind: ScalarType,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key2: Option<String>,
}

/// The filter descriptor: everything needed to compile one operation.
///
/// # Example
///
/// ```
/// use qfilter::ast::{Condition, Comparer, Exec, FilterCmd};
///
/// let cmd = FilterCmd::new("users", Exec::Find)
///     .condition(Condition::compare("age", Comparer::Gt, 30))
///     .sort("name_asc")
///     .take(10);
/// assert_eq!(cmd.table, "users");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterCmd {
    pub table: String,
    pub schema: Option<String>,
    pub exec: Exec,
    pub fields: Option<Vec<String>>,
    pub sort: Option<Vec<String>>,
    #[serde(rename = "filter")]
    pub conditions: Vec<Condition>,
    pub payload: Option<Payload>,
    pub scalar: Option<ScalarSpec>,
    pub query: Option<String>,
    pub params: Vec<Value>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
    pub returning: Option<Vec<String>>,
    pub primarykey: Option<String>,
    pub language: Option<String>,
    /// Shape update/remove RETURNING output as a single row.
    pub first: bool,
    /// Log the compiled statement.
    pub debug: bool,
}

impl FilterCmd {
    pub fn new(table: impl Into<String>, exec: Exec) -> Self {
        Self {
            table: table.into(),
            exec,
            ..Default::default()
        }
    }

    /// Raw query with positional parameters. `{where}` marks where the
    /// compiled WHERE clause goes.
    pub fn raw(table: impl Into<String>, template: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            exec: Exec::Query,
            query: Some(template.into()),
            params,
            ..Default::default()
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add a sort token, `<field>_<asc|desc>`.
    pub fn sort(mut self, token: impl Into<String>) -> Self {
        self.sort.get_or_insert_with(Vec::new).push(token.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn scalar(mut self, kind: ScalarType, key: Option<&str>, key2: Option<&str>) -> Self {
        self.scalar = Some(ScalarSpec {
            kind,
            key: key.map(str::to_string),
            key2: key2.map(str::to_string),
        });
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn returning<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.returning = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primarykey = Some(column.into());
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// `schema.table`, or the bare table.
    pub fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, self.table),
            _ => self.table.clone(),
        }
    }

    /// Columns requested back from a write: the explicit list, else the primary key.
    pub fn returning_columns(&self) -> Vec<String> {
        match (&self.returning, &self.primarykey) {
            (Some(cols), _) if !cols.is_empty() => cols.clone(),
            (_, Some(pk)) if !pk.is_empty() => vec![pk.clone()],
            _ => Vec::new(),
        }
    }

    pub fn language_code(&self) -> &str {
        self.language.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Comparer, MutationOp};

    #[test]
    fn test_descriptor_from_json() {
        let cmd: FilterCmd = serde_json::from_str(
            r#"{
                "table": "users",
                "schema": "app",
                "exec": "list",
                "fields": ["id", "name"],
                "sort": ["name_desc"],
                "filter": [{"type": "where", "name": "age", "comparer": ">", "value": 30}],
                "take": 10,
                "skip": 20
            }"#,
        )
        .unwrap();

        assert_eq!(cmd.exec, Exec::List);
        assert_eq!(cmd.qualified_table(), "app.users");
        assert_eq!(cmd.conditions, vec![Condition::compare("age", Comparer::Gt, 30)]);
        assert_eq!(cmd.take, Some(10));
        assert_eq!(cmd.skip, Some(20));
    }

    #[test]
    fn test_payload_and_scalar_from_json() {
        let cmd: FilterCmd = serde_json::from_str(
            r#"{
                "table": "stats",
                "exec": "update",
                "payload": {"+score": 5, "name": "x"},
                "scalar": {"type": "group", "key": "kind", "key2": "amount"}
            }"#,
        )
        .unwrap();

        let payload = cmd.payload.unwrap();
        assert_eq!(payload.entries[0].op, MutationOp::Add);
        assert_eq!(payload.entries[0].column, "score");
        assert_eq!(cmd.scalar.unwrap().kind, ScalarType::Group);
    }

    #[test]
    fn test_returning_falls_back_to_primary_key() {
        let cmd = FilterCmd::new("users", Exec::Insert).primary_key("id");
        assert_eq!(cmd.returning_columns(), vec!["id".to_string()]);

        let cmd = cmd.returning(["id", "created"]);
        assert_eq!(cmd.returning_columns(), vec!["id".to_string(), "created".to_string()]);
    }
}
