//! # qfilter: filter descriptors to SQL
//!
//! qfilter compiles a declarative filter descriptor into a parameterized SQL
//! statement for Oracle or PostgreSQL, runs it through a pluggable executor and
//! shapes the result for the operation kind.
//!
//! ## Quick Example
//!
//! ```
//! use qfilter::prelude::*;
//!
//! let compiler = Compiler::new(Dialect::Oracle);
//! let cmd = FilterCmd::new("users", Exec::Find)
//!     .condition(Condition::is_in("id", [1, 2]))
//!     .sort("name_desc")
//!     .take(10);
//!
//! let stmt = compiler.compile(&cmd).unwrap();
//! assert_eq!(
//!     stmt.text,
//!     "SELECT * FROM users WHERE \"id\" IN (:1,:2) ORDER BY \"name\" DESC FETCH FIRST 10 ROWS ONLY"
//! );
//! assert_eq!(stmt.params.len(), 2);
//! ```
//!
//! ## Mutation sigils
//!
//! | Key      | Meaning                           |
//! |----------|-----------------------------------|
//! | `col`    | assign                            |
//! | `+col`   | `COALESCE(col,0) + v`             |
//! | `-col`   | `COALESCE(col,0) - v`             |
//! | `*col`   | `COALESCE(col,0) * v`             |
//! | `/col`   | `COALESCE(col,0) / v`             |
//! | `>col`   | `GREATEST(col, v)`                |
//! | `<col`   | `LEAST(col, v)`                   |
//! | `!col`   | toggle 0/1                        |
//! | `=col`   | raw SQL expression                |
//! | `#col`   | raw SQL expression, update only   |

pub mod ast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::engine::{Engine, Executor, SqlxExecutor};
    pub use crate::error::*;
    pub use crate::mapper::{ExecResult, ListResult, Output};
    pub use crate::transpiler::{
        BindMode, CompiledStatement, Compiler, CompilerOptions, Dialect, Param, StatementKind,
    };
}
