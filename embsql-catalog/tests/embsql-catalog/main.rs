use std::sync::Arc;

use embsql_catalog::{
    Column, ColumnDefault, Database, Error, EvalContext, InformationSchema, LogicalType,
    MemoryDatabase, Provider, Result, Schema, Table, Value, INFORMATION_SCHEMA,
};
use proptest::prelude::*;

fn schema() -> Result<Schema> {
    Schema::new([
        Column::new("id", LogicalType::UInt64).primary_key().auto_increment(),
        Column::new("name", LogicalType::Text),
        Column::new("score", LogicalType::Float64)
            .nullable()
            .with_default(ColumnDefault::literal(0.0, LogicalType::Float64)?),
    ])
}

proptest! {
    #[test]
    fn auto_increment_is_dense_regardless_of_supplied_values(
        counter0 in 0u64..1_000_000,
        supplied in prop::collection::vec(prop::option::of(any::<u64>()), 1..32),
    ) {
        let table = Table::new("t", schema().unwrap().with_initial_counter(counter0));
        for id in &supplied {
            table
                .insert(&EvalContext::now(), [id.map(Value::UInt64), Some("John Doe".into()), None])
                .unwrap();
        }

        let ids = table
            .rows()
            .into_iter()
            .map(|row| row[0].clone().cast_non_null::<u64>().unwrap())
            .collect::<Vec<_>>();
        let k = supplied.len() as u64;
        prop_assert_eq!(ids, (counter0 + 1..=counter0 + k).collect::<Vec<_>>());
    }
}

#[test]
fn duplicate_table_name_keeps_existing_table() -> Result<()> {
    let db = MemoryDatabase::new("employees");
    let existing = db.add_table(Table::new("student_0000", schema()?))?;
    existing.insert(&EvalContext::now(), [None, Some("John Doe".into()), None])?;

    let err = db.add_table(Table::new("Student_0000", schema()?)).unwrap_err();
    assert!(matches!(&err, Error::DuplicateName { kind: "table", .. }), "{err}");
    assert_eq!(err.to_string(), "table `student_0000` already exists");

    assert_eq!(db.len(), 1);
    let table = db.get_table("STUDENT_0000").expect("table is still registered");
    assert!(Arc::ptr_eq(&table, &existing));
    assert_eq!(table.len(), 1);
    Ok(())
}

#[test]
fn duplicate_database_name() -> Result<()> {
    let provider = Provider::new([Arc::new(MemoryDatabase::new("employees")) as Arc<dyn Database>])?;
    let err = provider.add_database(Arc::new(MemoryDatabase::new("EMPLOYEES"))).unwrap_err();
    assert!(matches!(err, Error::DuplicateName { kind: "database", .. }), "{err}");
    assert_eq!(provider.databases().len(), 1);

    let err = Provider::new([
        Arc::new(InformationSchema::new()) as Arc<dyn Database>,
        Arc::new(InformationSchema::new()),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }), "{err}");
    Ok(())
}

#[test]
fn lookup_of_missing_entries() -> Result<()> {
    let provider = Provider::new([Arc::new(MemoryDatabase::new("employees")) as Arc<dyn Database>])?;
    assert!(matches!(provider.database("payroll"), Err(Error::NotFound { kind: "database", .. })));
    assert!(matches!(
        provider.table("employees", "student_9999"),
        Err(Error::NotFound { kind: "table", .. })
    ));
    Ok(())
}

#[test]
fn information_schema_describes_memory_databases() -> Result<()> {
    let db = MemoryDatabase::new("employees");
    let table = db.add_table(Table::new("student_0000", schema()?))?;
    table.insert(&EvalContext::now(), [None, Some("John Doe".into()), None])?;

    let provider = Provider::new([
        Arc::new(db) as Arc<dyn Database>,
        Arc::new(InformationSchema::new()),
    ])?;
    let info = provider.database(INFORMATION_SCHEMA)?;
    assert!(info.is_read_only());

    let schemata = provider.table(INFORMATION_SCHEMA, "schemata")?;
    let names = schemata.rows().into_iter().map(|row| row[0].to_string()).collect::<Vec<_>>();
    assert_eq!(names, ["employees", "information_schema"]);

    let tables = provider.table(INFORMATION_SCHEMA, "TABLES")?;
    let rows = tables.rows().into_iter().map(|row| row.to_string()).collect::<Vec<_>>();
    assert_eq!(rows, ["employees, student_0000, 1"]);

    let columns = provider.table(INFORMATION_SCHEMA, "columns")?;
    let rows = columns.rows().into_iter().map(|row| row.to_string()).collect::<Vec<_>>();
    assert_eq!(
        rows,
        [
            "employees, student_0000, id, 1, uint64, NO, PRI, auto_increment, NULL",
            "employees, student_0000, name, 2, text, NO, , , NULL",
            "employees, student_0000, score, 3, float64, YES, , , 0",
        ]
    );

    assert!(matches!(
        provider.table(INFORMATION_SCHEMA, "routines"),
        Err(Error::NotFound { .. })
    ));
    Ok(())
}
