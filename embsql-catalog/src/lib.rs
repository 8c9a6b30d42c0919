#![deny(rust_2018_idioms)]
//! The catalog: typed table schemas, in-memory tables, and the registries that expose them
//! to the query engine.

mod column;
mod database;
pub mod expr;
mod information_schema;
mod provider;
mod schema;
mod set;
mod table;

pub use embsql_core::{Error, LogicalType, Name, Result, Row, Value};

pub use self::column::{Column, ColumnDefault};
pub use self::database::{Database, MemoryDatabase};
pub use self::expr::{EvalContext, Expr, ScalarFunction};
pub use self::information_schema::{InformationSchema, INFORMATION_SCHEMA};
pub use self::provider::Provider;
pub use self::schema::Schema;
pub use self::table::Table;
