//! SQL dialect tests (Oracle, PostgreSQL).

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use super::inputs;
use crate::ast::*;
use crate::transpiler::{BindMode, Compiler, CompilerOptions, Dialect, Param};

fn inline(dialect: Dialect) -> Compiler {
    Compiler::with_options(
        dialect,
        CompilerOptions {
            bind_mode: BindMode::Inline,
            ..Default::default()
        },
    )
}

#[test]
fn test_postgres_placeholders() {
    let cmd = FilterCmd::new("users", Exec::Find)
        .condition(Condition::compare("age", Comparer::Gt, 30))
        .condition(Condition::is_in("id", [1, 2]));
    let stmt = Compiler::new(Dialect::Postgres).compile(&cmd).unwrap();
    assert_eq!(
        stmt.text,
        "SELECT * FROM users WHERE \"age\">$1 AND \"id\" IN ($2,$3)"
    );
    assert_eq!(stmt.params.len(), 3);
}

#[test]
fn test_pagination() {
    let cmd = FilterCmd::new("users", Exec::Find).take(10).skip(20);
    assert_eq!(
        Compiler::new(Dialect::Oracle).compile(&cmd).unwrap().text,
        "SELECT * FROM users OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(
        Compiler::new(Dialect::Postgres).compile(&cmd).unwrap().text,
        "SELECT * FROM users LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_pagination_one_sided() {
    let take = FilterCmd::new("users", Exec::Find).take(5);
    let skip = FilterCmd::new("users", Exec::Find).skip(5);
    let oracle = Compiler::new(Dialect::Oracle);
    let pg = Compiler::new(Dialect::Postgres);

    assert_eq!(oracle.compile(&take).unwrap().text, "SELECT * FROM users FETCH FIRST 5 ROWS ONLY");
    assert_eq!(oracle.compile(&skip).unwrap().text, "SELECT * FROM users OFFSET 5 ROWS");
    assert_eq!(pg.compile(&take).unwrap().text, "SELECT * FROM users LIMIT 5");
    assert_eq!(pg.compile(&skip).unwrap().text, "SELECT * FROM users OFFSET 5");
}

#[test]
fn test_inline_booleans() {
    let cmd = FilterCmd::new("users", Exec::Find).condition(Condition::eq("active", true));
    assert_eq!(
        inline(Dialect::Oracle).compile(&cmd).unwrap().text,
        "SELECT * FROM users WHERE \"active\"=1"
    );
    assert_eq!(
        inline(Dialect::Postgres).compile(&cmd).unwrap().text,
        "SELECT * FROM users WHERE \"active\"=TRUE"
    );
}

#[test]
fn test_inline_dates() {
    let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    let cmd = FilterCmd::new("events", Exec::Find)
        .condition(Condition::compare("created", Comparer::Gte, dt));
    assert_eq!(
        inline(Dialect::Oracle).compile(&cmd).unwrap().text,
        "SELECT * FROM events WHERE \"created\">=TO_DATE('2024-01-02 03:04:05', 'YYYY-MM-DD HH24:MI:SS')"
    );
    assert_eq!(
        inline(Dialect::Postgres).compile(&cmd).unwrap().text,
        "SELECT * FROM events WHERE \"created\">=TIMESTAMP '2024-01-02 03:04:05'"
    );
}

#[test]
fn test_returning_per_dialect() {
    let cmd = FilterCmd::new("users", Exec::Insert)
        .payload(Payload::new().set("name", "ann"))
        .returning(["id", "created"]);

    let oracle = Compiler::new(Dialect::Oracle).compile(&cmd).unwrap();
    assert_eq!(
        oracle.text,
        "INSERT INTO users (\"name\") VALUES (:1) RETURNING \"id\",\"created\" INTO :2,:3"
    );
    assert_eq!(
        oracle.params,
        vec![
            Param::In(Value::from("ann")),
            Param::Out { column: "id".to_string() },
            Param::Out { column: "created".to_string() },
        ]
    );
    assert_eq!(oracle.returning, vec!["id".to_string(), "created".to_string()]);

    let pg = Compiler::new(Dialect::Postgres).compile(&cmd).unwrap();
    assert_eq!(
        pg.text,
        "INSERT INTO users (\"name\") VALUES ($1) RETURNING \"id\",\"created\""
    );
    assert_eq!(inputs(&pg.params), vec![Value::from("ann")]);
    assert_eq!(pg.params.len(), 1);
}

#[test]
fn test_identifier_quote_doubling() {
    let cmd = FilterCmd::new("t", Exec::Insert).payload(Payload::new().set("we\"ird", 1));
    assert_eq!(
        Compiler::new(Dialect::Postgres).compile(&cmd).unwrap().text,
        "INSERT INTO t (\"we\"\"ird\") VALUES ($1)"
    );
}

#[test]
fn test_escape_is_public() {
    let compiler = Compiler::new(Dialect::Postgres);
    assert_eq!(compiler.escape(&Value::from("it's")), "'it''s'");
    assert_eq!(compiler.escape(&Value::Bool(false)), "FALSE");
    assert_eq!(Compiler::new(Dialect::Oracle).escape(&Value::Bool(false)), "0");
}

#[test]
fn test_dialect_from_str() {
    assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("ORACLE".parse::<Dialect>().unwrap(), Dialect::Oracle);
    assert!("sybase".parse::<Dialect>().is_err());
}
