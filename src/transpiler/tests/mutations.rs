//! INSERT and UPDATE payload tests.

use pretty_assertions::assert_eq;

use super::inputs;
use crate::ast::*;
use crate::error::FilterError;
use crate::transpiler::{Compiler, Dialect, Param, StatementKind};

fn oracle() -> Compiler {
    Compiler::new(Dialect::Oracle)
}

#[test]
fn test_insert() {
    let cmd = FilterCmd::new("users", Exec::Insert)
        .schema("app")
        .payload(Payload::new().set("name", "ann").set("age", 31));
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(stmt.text, "INSERT INTO app.users (\"name\",\"age\") VALUES (:1,:2)");
    assert_eq!(inputs(&stmt.params), vec![Value::from("ann"), Value::Int(31)]);
    assert_eq!(stmt.kind, StatementKind::Write);
}

#[test]
fn test_insert_modes_per_sigil() {
    let payload = Payload::from_sigils([
        ("+score", Value::Int(0)),
        ("-debt", Value::Null),
        (">level", Value::Int(3)),
        ("!flag", Value::Bool(true)),
        ("=created", Value::from("SYSDATE")),
        ("#touched", Value::from("SYSDATE")),
    ]);
    let cmd = FilterCmd::new("t", Exec::Insert).payload(payload);
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(
        stmt.text,
        "INSERT INTO t (\"score\",\"debt\",\"level\",\"flag\",\"created\") VALUES (:1,:2,:3,0,SYSDATE)"
    );
    assert_eq!(
        inputs(&stmt.params),
        vec![Value::Int(0), Value::Int(0), Value::Int(3)]
    );
}

#[test]
fn test_update_increment() {
    let cmd = FilterCmd::new("stats", Exec::Update)
        .payload(Payload::from_sigils([("+score", Value::Int(5))]))
        .condition(Condition::eq("id", 1));
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE stats SET \"score\" = COALESCE(\"score\",0) + :1 WHERE \"id\"=:2"
    );
    assert_eq!(inputs(&stmt.params), vec![Value::Int(5), Value::Int(1)]);
}

#[test]
fn test_update_all_operations() {
    let payload = Payload::new()
        .set("name", "bo")
        .decrement("stock", 2)
        .push(Mutation::new("price", MutationOp::Multiply, 2))
        .push(Mutation::new("ratio", MutationOp::Divide, 4))
        .greatest("high", 10)
        .least("low", 1)
        .toggle("active")
        .raw("seen", "SYSDATE")
        .push(Mutation::new("touched", MutationOp::RawUpdate, "SYSDATE"));
    let cmd = FilterCmd::new("items", Exec::Update).payload(payload);
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE items SET \"name\" = :1,\
         \"stock\" = COALESCE(\"stock\",0) - :2,\
         \"price\" = COALESCE(\"price\",0) * :3,\
         \"ratio\" = COALESCE(\"ratio\",0) / :4,\
         \"high\" = GREATEST(\"high\",:5),\
         \"low\" = LEAST(\"low\",:6),\
         \"active\" = CASE \"active\" WHEN 1 THEN 0 ELSE 1 END,\
         \"seen\" = SYSDATE,\
         \"touched\" = SYSDATE"
    );
    assert_eq!(stmt.params.len(), 6);
}

#[test]
fn test_absent_values_are_skipped() {
    let payload = Payload::new()
        .set("name", "x")
        .set_opt("nickname", None::<&str>)
        .set("bio", Value::Null);
    let cmd = FilterCmd::new("users", Exec::Update).payload(payload);
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(stmt.text, "UPDATE users SET \"name\" = :1,\"bio\" = :2");
    assert_eq!(inputs(&stmt.params), vec![Value::from("x"), Value::Null]);
}

#[test]
fn test_empty_payload_errors() {
    let insert = FilterCmd::new("users", Exec::Insert);
    assert!(matches!(
        oracle().compile(&insert).unwrap_err(),
        FilterError::EmptyPayload { exec: "insert", .. }
    ));

    let update = FilterCmd::new("users", Exec::Update)
        .payload(Payload::new().set_opt("a", None::<i64>));
    let err = oracle().compile(&update).unwrap_err();
    assert!(matches!(err, FilterError::EmptyPayload { exec: "update", .. }));
    assert!(err.is_compile());

    // Only update-only raw entries: nothing to insert.
    let insert = FilterCmd::new("users", Exec::Insert)
        .payload(Payload::from_sigils([("#seen", Value::from("SYSDATE"))]));
    assert!(oracle().compile(&insert).is_err());
}

#[test]
fn test_update_returning_binds_after_where() {
    let cmd = FilterCmd::new("users", Exec::Update)
        .payload(Payload::new().set("name", "z"))
        .condition(Condition::eq("id", 4))
        .primary_key("id");
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE users SET \"name\" = :1 WHERE \"id\"=:2 RETURNING \"id\" INTO :3"
    );
    assert_eq!(stmt.params[2], Param::Out { column: "id".to_string() });
    assert!(stmt.has_returning());
}

#[test]
fn test_remove_returning() {
    let cmd = FilterCmd::new("users", Exec::Remove)
        .condition(Condition::eq("id", 4))
        .returning(["id", "name"]);
    assert_eq!(
        Compiler::new(Dialect::Postgres).compile(&cmd).unwrap().text,
        "DELETE FROM users WHERE \"id\"=$1 RETURNING \"id\",\"name\""
    );
}

#[test]
fn test_payload_from_json_keeps_order() {
    let cmd: FilterCmd = serde_json::from_str(
        r#"{"table": "t", "exec": "insert", "payload": {"b": 1, "a": 2, "+c": 3}}"#,
    )
    .unwrap();
    let stmt = oracle().compile(&cmd).unwrap();
    assert_eq!(stmt.text, "INSERT INTO t (\"b\",\"a\",\"c\") VALUES (:1,:2,:3)");
}

#[test]
fn test_toggle_uses_dialect_booleans() {
    let pg = Compiler::new(Dialect::Postgres);

    let insert = FilterCmd::new("flags", Exec::Insert).payload(Payload::new().toggle("active"));
    assert_eq!(oracle().compile(&insert).unwrap().text, "INSERT INTO flags (\"active\") VALUES (0)");
    assert_eq!(pg.compile(&insert).unwrap().text, "INSERT INTO flags (\"active\") VALUES (FALSE)");

    let update = FilterCmd::new("flags", Exec::Update).payload(Payload::new().toggle("active"));
    let stmt = pg.compile(&update).unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE flags SET \"active\" = CASE \"active\" WHEN TRUE THEN FALSE ELSE TRUE END"
    );
    assert!(stmt.params.is_empty());
}
