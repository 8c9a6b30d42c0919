use std::sync::Arc;

use embsql::fixture::{self, DATABASE_NAME, TABLE_COUNT, TABLE_NAME_PREFIX};
use embsql::{
    Engine, Error, MaterializedQueryOutput, Permissions, Principal, QueryEngine, Result, Session,
    Value,
};
use embsql_core::NaiveDateTime;
use expect_test::{expect, Expect};
use tracing_subscriber::EnvFilter;

fn setup() -> Result<(Engine, Session)> {
    let filter =
        EnvFilter::try_from_env("EMBSQL_LOG").unwrap_or_else(|_| EnvFilter::new("embsql=debug"));
    let _ = tracing_subscriber::fmt::fmt().with_env_filter(filter).with_test_writer().try_init();

    let provider = fixture::create_test_provider(DATABASE_NAME, TABLE_NAME_PREFIX, TABLE_COUNT)?;
    let engine = Engine::new(provider);
    let session = engine.connect(Principal::new("root", Permissions::ALL));
    Ok((engine, session))
}

fn render(output: &MaterializedQueryOutput) -> String {
    let mut rendered = output.columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" | ");
    rendered.push('\n');
    for row in &output.rows {
        let line = row.values().map(|v| v.to_string()).collect::<Vec<_>>().join(" | ");
        rendered.push_str(line.trim_end());
        rendered.push('\n');
    }
    rendered
}

fn check(engine: &Engine, session: &mut Session, request: &str, expect: Expect) -> Result<()> {
    let output = engine.execute(session, request)?;
    expect.assert_eq(&render(&output));
    Ok(())
}

#[test]
fn seeding_creates_numbered_tables() -> Result<()> {
    let db = fixture::create_test_database(DATABASE_NAME, TABLE_NAME_PREFIX, TABLE_COUNT)?;
    let tables = db.tables();
    assert_eq!(tables.len(), 32);

    for (i, table) in tables.iter().enumerate() {
        assert_eq!(table.name().as_str(), fixture::table_name("student", i));
        assert_eq!(table.len(), 2);

        let rows = table.rows();
        for (row, expected_id) in rows.iter().zip([1, 2]) {
            assert_eq!(row[0], Value::UInt64(expected_id));
            assert_eq!(row[2], Value::from("John Doe"));
            assert_eq!(row[3], Value::Float64(0.0));
            assert_eq!(row[4], Value::from("John"));
            assert_eq!(row[5], Value::UInt8(1));
            assert_eq!(row[6], Value::UInt16(0));
            assert!(matches!(row[7], Value::Timestamp(_)));
            assert!(matches!(row[8], Value::Timestamp(_)));
        }
        assert_eq!(rows[0][1], Value::UInt64(i as u64));
        assert_eq!(rows[1][1], Value::UInt64(i as u64 + 1));
        assert_eq!(table.next_auto_increment(), Some(3));
    }

    assert_eq!(tables[0].name().as_str(), "student_0000");
    assert_eq!(tables[31].name().as_str(), "student_0031");
    Ok(())
}

#[test]
fn seeded_timestamps_are_evaluated_per_row() -> Result<()> {
    let table = fixture::seed_table("student_0000", 0)?;
    let rows = table.rows();
    let created = rows
        .iter()
        .map(|row| row[7].clone().cast_non_null::<NaiveDateTime>())
        .collect::<Result<Vec<_>, _>>()?;
    assert!(created[0] <= created[1]);
    Ok(())
}

#[test]
fn show_requests() -> Result<()> {
    let (engine, mut session) = setup()?;
    check(
        &engine,
        &mut session,
        "SHOW DATABASES",
        expect![[r#"
            database
            employees
            information_schema
        "#]],
    )?;

    let output = engine.execute(&mut session, "SHOW TABLES FROM employees")?;
    assert_eq!(output.columns[0].as_str(), "tables_in_employees");
    assert_eq!(output.rows.len(), TABLE_COUNT);
    assert_eq!(output.rows[0][0], Value::from("student_0000"));

    let err = engine.execute(&mut session, "SHOW TABLES").unwrap_err();
    assert!(matches!(err, Error::NoDatabaseSelected), "{err}");

    engine.execute(&mut session, "USE information_schema")?;
    check(
        &engine,
        &mut session,
        "SHOW TABLES",
        expect![[r#"
            tables_in_information_schema
            columns
            schemata
            tables
        "#]],
    )?;
    Ok(())
}

#[test]
fn describe_student_table() -> Result<()> {
    let (engine, mut session) = setup()?;
    check(
        &engine,
        &mut session,
        "DESCRIBE employees.student_0001",
        expect![[r#"
            field | type | null | key | default | extra
            id | uint64 | NO | PRI | NULL | auto_increment
            uid | uint64 | NO |  | NULL |
            name | text | NO |  | NULL |
            score | float64 | YES |  | 0 |
            nickname | text | YES |  | NULL |
            gender | uint8 | YES |  | NULL |
            birth_year | uint16 | YES |  | 0 |
            created_at | timestamp | NO |  | now() |
            modified_at | timestamp | NO |  | now() |
        "#]],
    )
}

#[test]
fn select_with_limit() -> Result<()> {
    let (engine, mut session) = setup()?;
    engine.execute(&mut session, "use employees")?;

    let output = engine.execute(&mut session, "SELECT * FROM student_0005 LIMIT 1")?;
    assert_eq!(output.columns.len(), 9);
    assert_eq!(output.types[7], embsql::LogicalType::Timestamp);
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0][1], Value::UInt64(5));

    let output = engine.execute(&mut session, "SELECT * FROM student_0005")?;
    assert_eq!(output.rows.len(), 2);

    let output = engine.execute(&mut session, "SELECT * FROM information_schema.tables")?;
    assert_eq!(output.rows.len(), TABLE_COUNT);
    assert_eq!(output.rows[3].to_string(), "employees, student_0003, 2");
    Ok(())
}

#[test]
fn insert_assigns_id_and_defaults() -> Result<()> {
    let (engine, mut session) = setup()?;
    let output = engine.execute(
        &mut session,
        "INSERT INTO employees.student_0000 VALUES (42, 9, 'Jane Roe', DEFAULT, NULL, 2, 1999, DEFAULT, '2023-01-02 03:04:05')",
    )?;
    let row = &output.rows[0];
    // the supplied id is ignored
    assert_eq!(row[0], Value::UInt64(3));
    assert_eq!(row[3], Value::Float64(0.0));
    assert_eq!(row[4], Value::Null);
    assert_eq!(row[5], Value::UInt8(2));
    assert_eq!(row[6], Value::UInt16(1999));
    assert!(matches!(row[7], Value::Timestamp(_)));
    assert_eq!(row[8].to_string(), "2023-01-02 03:04:05");

    let table = engine.provider().table(DATABASE_NAME, "student_0000")?;
    assert_eq!(table.len(), 3);
    Ok(())
}

#[test]
fn failed_inserts_leave_tables_untouched() -> Result<()> {
    let (engine, mut session) = setup()?;
    engine.execute(&mut session, "USE employees")?;

    let err = engine
        .execute(&mut session, "INSERT INTO student_0000 VALUES (DEFAULT, 1, NULL, 0, NULL, NULL, 0, DEFAULT, DEFAULT)")
        .unwrap_err();
    assert!(matches!(&err, Error::ConstraintViolation { column, .. } if column == "name"), "{err}");

    let err = engine
        .execute(&mut session, "INSERT INTO student_0000 VALUES (DEFAULT, 1, 'x', 0, NULL, 256, 0, DEFAULT, DEFAULT)")
        .unwrap_err();
    assert!(matches!(err, Error::Type(_)), "{err}");

    let err = engine.execute(&mut session, "INSERT INTO student_0000 VALUES (DEFAULT)").unwrap_err();
    assert!(matches!(err, Error::Type(_)), "{err}");

    let err = engine
        .execute(&mut session, "INSERT INTO information_schema.schemata VALUES ('x')")
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)), "{err}");

    let err = engine.execute(&mut session, "INSERT INTO student_9999 VALUES ()").unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "table", .. }), "{err}");

    let table = engine.provider().table(DATABASE_NAME, "student_0000")?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.next_auto_increment(), Some(3));
    Ok(())
}

#[test]
fn concurrent_sessions_share_tables() -> Result<()> {
    let (engine, _) = setup()?;
    let engine = Arc::new(engine);

    let handles = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || -> Result<()> {
                let mut session = engine.connect(Principal::new("root", Permissions::ALL));
                for _ in 0..25 {
                    engine.execute(
                        &mut session,
                        "INSERT INTO employees.student_0001 VALUES (DEFAULT, 0, 'x', DEFAULT, DEFAULT, DEFAULT, DEFAULT, DEFAULT, DEFAULT)",
                    )?;
                }
                Ok(())
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().expect("insert thread panicked")?;
    }

    let table = engine.provider().table(DATABASE_NAME, "student_0001")?;
    let ids = table
        .rows()
        .into_iter()
        .map(|row| row[0].clone().cast_non_null::<u64>())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(ids, (1..=102).collect::<Vec<_>>());
    Ok(())
}
