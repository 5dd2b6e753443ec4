//! Payload compilation for INSERT and UPDATE.
//!
//! `Raw` and `RawUpdate` entries are emitted without escaping. Callers using
//! them are trusted to supply valid SQL.

use crate::ast::*;
use crate::transpiler::escape::ParamContext;
use crate::transpiler::traits::SqlGenerator;

/// Parallel column and value-expression lists of an INSERT.
#[derive(Debug, Default, PartialEq)]
pub struct InsertParts {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

fn delta_operand(value: Value) -> Value {
    if value.is_falsy() { Value::Int(0) } else { value }
}

pub fn compile_insert(
    payload: &Payload,
    generator: &dyn SqlGenerator,
    ctx: &mut ParamContext,
) -> InsertParts {
    let mut parts = InsertParts::default();

    for m in &payload.entries {
        let Some(value) = m.value.clone() else {
            continue;
        };
        let value = value.resolve();

        let expr = match m.op {
            MutationOp::Set | MutationOp::Greatest | MutationOp::Least => {
                ctx.bind(value, generator)
            }
            MutationOp::Add | MutationOp::Subtract | MutationOp::Multiply | MutationOp::Divide => {
                ctx.bind(delta_operand(value), generator)
            }
            MutationOp::Toggle => generator.bool_literal(false),
            MutationOp::Raw => value.to_raw_text(),
            MutationOp::RawUpdate => continue,
        };

        parts.columns.push(generator.quote_identifier(&m.column));
        parts.values.push(expr);
    }

    parts
}

/// `col = expr` fragments of an UPDATE SET clause.
pub fn compile_update(
    payload: &Payload,
    generator: &dyn SqlGenerator,
    ctx: &mut ParamContext,
) -> Vec<String> {
    let mut assignments = Vec::with_capacity(payload.entries.len());

    for m in &payload.entries {
        let Some(value) = m.value.clone() else {
            continue;
        };
        let value = value.resolve();
        let col = generator.quote_identifier(&m.column);

        let expr = match m.op {
            MutationOp::Set => ctx.bind(value, generator),
            MutationOp::Add | MutationOp::Subtract | MutationOp::Multiply | MutationOp::Divide => {
                let op = m.op.arithmetic().unwrap_or("+");
                format!("COALESCE({},0) {} {}", col, op, ctx.bind(delta_operand(value), generator))
            }
            MutationOp::Greatest => format!("GREATEST({},{})", col, ctx.bind(value, generator)),
            MutationOp::Least => format!("LEAST({},{})", col, ctx.bind(value, generator)),
            MutationOp::Toggle => generator.toggle(&col),
            MutationOp::Raw | MutationOp::RawUpdate => value.to_raw_text(),
        };

        assignments.push(format!("{} = {}", col, expr));
    }

    assignments
}
