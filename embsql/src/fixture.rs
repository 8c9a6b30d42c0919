//! The reference data set: a database of identically shaped `student` tables.

use std::sync::Arc;

use embsql_catalog::{
    Column, ColumnDefault, Database, EvalContext, InformationSchema, MemoryDatabase, Provider,
    Schema, Table,
};
use embsql_core::{LogicalType, Result, Value};

pub const DATABASE_NAME: &str = "employees";
pub const TABLE_NAME_PREFIX: &str = "student";
pub const TABLE_COUNT: usize = 32;

/// The name of the `i`th generated table, e.g. `student_0007`.
pub fn table_name(prefix: &str, i: usize) -> String {
    format!("{prefix}_{i:04}")
}

pub fn student_schema() -> Result<Schema> {
    Schema::new([
        Column::new("id", LogicalType::UInt64).primary_key().auto_increment(),
        Column::new("uid", LogicalType::UInt64),
        Column::new("name", LogicalType::Text),
        Column::new("score", LogicalType::Float64)
            .nullable()
            .with_default(ColumnDefault::literal(0.0, LogicalType::Float64)?),
        Column::new("nickname", LogicalType::Text).nullable(),
        Column::new("gender", LogicalType::UInt8).nullable(),
        Column::new("birth_year", LogicalType::UInt16)
            .nullable()
            .with_default(ColumnDefault::literal(0u64, LogicalType::UInt16)?),
        Column::new("created_at", LogicalType::Timestamp)
            .with_default(ColumnDefault::current_timestamp()),
        Column::new("modified_at", LogicalType::Timestamp)
            .with_default(ColumnDefault::current_timestamp()),
    ])
}

/// Create the `i`th table and insert its two rows, with `uid` set to `i` and `i + 1`.
/// Every row is inserted with its own evaluation context.
pub fn seed_table(name: &str, i: usize) -> Result<Table> {
    let table = Table::new(name, student_schema()?);
    for uid in [i as u64, i as u64 + 1] {
        table.insert(
            &EvalContext::now(),
            [
                // assigned by auto-increment
                None,
                Some(Value::UInt64(uid)),
                Some("John Doe".into()),
                None,
                Some("John".into()),
                Some(Value::UInt8(1)),
                None,
                None,
                None,
            ],
        )?;
    }
    Ok(table)
}

/// A database holding `n` seeded tables named `{prefix}_0000` onwards.
pub fn create_test_database(name: &str, prefix: &str, n: usize) -> Result<MemoryDatabase> {
    let db = MemoryDatabase::new(name);
    for i in 0..n {
        db.add_table(seed_table(&table_name(prefix, i), i)?)?;
    }
    tracing::info!(database = name, tables = n, "seeded test database");
    Ok(db)
}

/// The seeded database alongside `information_schema`.
pub fn create_test_provider(name: &str, prefix: &str, n: usize) -> Result<Arc<Provider>> {
    let provider = Provider::new([
        Arc::new(create_test_database(name, prefix, n)?) as Arc<dyn Database>,
        Arc::new(InformationSchema::new()),
    ])?;
    Ok(Arc::new(provider))
}
