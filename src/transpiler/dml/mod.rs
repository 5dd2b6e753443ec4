//! DML statement builders.

pub mod delete;
pub mod insert;
pub mod query;
pub mod scalar;
pub mod select;
pub mod update;
