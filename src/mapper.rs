//! Result shaping.
//!
//! Maps the raw response of one executed statement to the value returned for
//! its operation kind.

use std::collections::HashMap;

use serde::Serialize;

use crate::ast::{Exec, FilterCmd, ScalarType};

/// One result row, column name to JSON value.
pub type Row = HashMap<String, serde_json::Value>;

/// Raw response from the execution adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
}

impl ExecResult {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows_affected: rows.len() as u64,
            rows,
        }
    }

    pub fn affected(n: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected: n,
        }
    }
}

/// `list` composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult {
    pub items: Vec<Row>,
    pub count: u64,
}

/// Shaped operation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Rows(Vec<Row>),
    Row(Option<Row>),
    Value(Option<serde_json::Value>),
    Count(Option<u64>),
    Exists(bool),
    Affected(u64),
    List(ListResult),
}

/// Case-insensitive column lookup. Dialects differ in how they fold alias case.
pub fn row_field<'a>(row: &'a Row, name: &str) -> Option<&'a serde_json::Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn as_count(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_count(result: &ExecResult) -> Option<u64> {
    result
        .rows
        .first()
        .and_then(|row| row_field(row, "COUNT"))
        .and_then(as_count)
}

fn returned_rows(cmd: &FilterCmd, result: ExecResult) -> Output {
    if cmd.first {
        Output::Row(result.rows.into_iter().next())
    } else {
        Output::Rows(result.rows)
    }
}

/// Shape the response of a single statement compiled for `exec`.
pub fn map_result(cmd: &FilterCmd, exec: Exec, result: ExecResult) -> Output {
    let wants_returning = !cmd.returning_columns().is_empty();

    match exec {
        Exec::Insert => {
            if cmd.returning.as_ref().is_some_and(|r| !r.is_empty()) {
                Output::Row(result.rows.into_iter().next())
            } else if let Some(pk) = cmd.primarykey.as_deref().filter(|pk| !pk.is_empty()) {
                Output::Value(
                    result
                        .rows
                        .first()
                        .and_then(|row| row_field(row, pk))
                        .cloned(),
                )
            } else {
                Output::Affected(result.rows_affected)
            }
        }
        Exec::Update | Exec::Remove => {
            if wants_returning {
                returned_rows(cmd, result)
            } else {
                Output::Affected(result.rows_affected)
            }
        }
        Exec::Check => Output::Exists(first_count(&result).is_some_and(|n| n > 0)),
        Exec::Count => Output::Count(first_count(&result)),
        Exec::Scalar => match cmd.scalar.as_ref().map(|s| s.kind) {
            Some(ScalarType::Group) => Output::Rows(result.rows),
            _ => Output::Value(
                result
                    .rows
                    .first()
                    .and_then(|row| row_field(row, "VALUE"))
                    .cloned(),
            ),
        },
        Exec::Drop | Exec::Truncate => Output::Affected(result.rows_affected),
        Exec::Find | Exec::Read | Exec::List | Exec::Query => Output::Rows(result.rows),
    }
}

/// Combine the two responses of a `list`.
pub fn map_list(data: ExecResult, count: ExecResult) -> Output {
    Output::List(ListResult {
        items: data.rows,
        count: first_count(&count).unwrap_or(0),
    })
}
