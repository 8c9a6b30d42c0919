use std::sync::Arc;

use embsql_core::{Error, LogicalType, Name, Result, Value};

use crate::{Column, Database, EvalContext, Provider, Schema, Table};

pub const INFORMATION_SCHEMA: &str = "information_schema";

const SCHEMATA: &str = "schemata";
const TABLES: &str = "tables";
const COLUMNS: &str = "columns";

/// A read-only database describing every other database registered in the same provider.
///
/// Its tables are rebuilt on every lookup. Virtual databases (including this one) are listed
/// in `schemata` but their tables are not described.
#[derive(Debug)]
pub struct InformationSchema {
    name: Name,
}

impl Default for InformationSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InformationSchema {
    pub fn new() -> Self {
        Self { name: Name::new_inline(INFORMATION_SCHEMA) }
    }
}

impl Database for InformationSchema {
    #[inline]
    fn name(&self) -> &Name {
        &self.name
    }

    fn table_names(&self, _provider: &Provider) -> Vec<Name> {
        vec![Name::new_inline(COLUMNS), Name::new_inline(SCHEMATA), Name::new_inline(TABLES)]
    }

    fn table(&self, provider: &Provider, name: &str) -> Result<Arc<Table>> {
        let table = match Name::from(name).as_str() {
            SCHEMATA => schemata(provider)?,
            TABLES => tables(provider)?,
            COLUMNS => columns(provider)?,
            _ => return Err(Error::NotFound { kind: "table", name: name.into() }),
        };
        Ok(Arc::new(table))
    }

    #[inline]
    fn is_read_only(&self) -> bool {
        true
    }
}

fn text(name: &str) -> Column {
    Column::new(name, LogicalType::Text)
}

fn schemata(provider: &Provider) -> Result<Table> {
    let table = Table::new(SCHEMATA, Schema::new([text("schema_name")])?);
    let ctx = EvalContext::now();
    for name in provider.database_names() {
        table.insert(&ctx, [Some(name.into())])?;
    }
    Ok(table)
}

/// Memory-backed databases, the only ones whose tables are described.
fn described(provider: &Provider) -> impl Iterator<Item = Arc<dyn Database>> {
    provider.databases().into_iter().filter(|db| !db.is_read_only())
}

fn tables(provider: &Provider) -> Result<Table> {
    let schema = Schema::new([
        text("table_schema"),
        text("table_name"),
        Column::new("table_rows", LogicalType::UInt64),
    ])?;
    let table = Table::new(TABLES, schema);
    let ctx = EvalContext::now();
    for db in described(provider) {
        for name in db.table_names(provider) {
            let rows = db.table(provider, &name)?.len() as u64;
            table.insert(
                &ctx,
                [Some(db.name().clone().into()), Some(name.into()), Some(rows.into())],
            )?;
        }
    }
    Ok(table)
}

fn columns(provider: &Provider) -> Result<Table> {
    let schema = Schema::new([
        text("table_schema"),
        text("table_name"),
        text("column_name"),
        Column::new("ordinal_position", LogicalType::UInt64),
        text("data_type"),
        text("is_nullable"),
        text("column_key"),
        text("extra"),
        text("column_default").nullable(),
    ])?;
    let table = Table::new(COLUMNS, schema);
    let ctx = EvalContext::now();
    for db in described(provider) {
        for name in db.table_names(provider) {
            let source = db.table(provider, &name)?;
            for (idx, column) in source.schema().columns().iter().enumerate() {
                table.insert(
                    &ctx,
                    [
                        Some(db.name().clone().into()),
                        Some(Name::clone(&name).into()),
                        Some(column.name().clone().into()),
                        Some(Value::UInt64(idx as u64 + 1)),
                        Some(column.logical_type().to_string().into()),
                        Some((if column.is_nullable() { "YES" } else { "NO" }).into()),
                        Some((if column.is_primary_key() { "PRI" } else { "" }).into()),
                        Some((if column.is_auto_increment() { "auto_increment" } else { "" }).into()),
                        Some(column.default().map(|default| default.to_string()).into()),
                    ],
                )?;
            }
        }
    }
    Ok(table)
}
