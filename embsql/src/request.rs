//! The request language understood by [`crate::Engine`].
//!
//! ```text
//! SHOW DATABASES
//! SHOW TABLES [FROM db]
//! USE db
//! DESCRIBE [db.]table
//! SELECT * FROM [db.]table [LIMIT n]
//! INSERT INTO [db.]table VALUES (v, ...)
//! ```
//!
//! Requests are parsed as MySQL-dialect SQL and lowered to [`Request`]. Anything outside the
//! forms above is rejected with [`Error::Parse`].

use std::fmt;

use embsql_core::{Error, Name, Result, Value};
use itertools::Itertools;
use sqlparser::ast::{
    self, Expr, ObjectName, Query, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
    UnaryOperator,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ShowDatabases,
    ShowTables { database: Option<Name> },
    Use { database: Name },
    Describe { table: TableRef },
    Select { table: TableRef, limit: Option<u64> },
    /// One slot per column; `None` is `DEFAULT`.
    Insert { table: TableRef, values: Vec<Option<Value>> },
}

/// A possibly database-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: Option<Name>,
    pub table: Name,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(database) => write!(f, "{database}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::ShowDatabases => write!(f, "SHOW DATABASES"),
            Request::ShowTables { database: None } => write!(f, "SHOW TABLES"),
            Request::ShowTables { database: Some(database) } => {
                write!(f, "SHOW TABLES FROM {database}")
            }
            Request::Use { database } => write!(f, "USE {database}"),
            Request::Describe { table } => write!(f, "DESCRIBE {table}"),
            Request::Select { table, limit: None } => write!(f, "SELECT * FROM {table}"),
            Request::Select { table, limit: Some(limit) } => {
                write!(f, "SELECT * FROM {table} LIMIT {limit}")
            }
            Request::Insert { table, values } => {
                let values = values.iter().format_with(", ", |value, f| match value {
                    None => f(&"DEFAULT"),
                    Some(Value::Text(s)) => f(&format!("'{}'", s.replace('\'', "''"))),
                    Some(value) => f(value),
                });
                write!(f, "INSERT INTO {table} VALUES ({values})")
            }
        }
    }
}

static DIALECT: MySqlDialect = MySqlDialect {};

/// Parse a single request.
pub fn parse(request: &str) -> Result<Request> {
    let mut statements =
        Parser::parse_sql(&DIALECT, request).map_err(|err| Error::Parse(err.to_string()))?;
    match statements.len() {
        0 => Err(Error::Parse("empty request".into())),
        1 => lower(statements.remove(0)),
        n => Err(Error::Parse(format!("expected a single statement, found {n}"))),
    }
}

fn unsupported(what: &str, node: impl fmt::Display) -> Error {
    Error::Parse(format!("unsupported {what} `{node}`"))
}

fn lower(statement: Statement) -> Result<Request> {
    match statement {
        Statement::ShowVariable { variable, .. } => match &variable[..] {
            [ident] if ["databases", "schemas"].contains(&ident.value.to_lowercase().as_str()) => {
                Ok(Request::ShowDatabases)
            }
            _ => Err(Error::Parse(format!(
                "expected `DATABASES` or `TABLES` after `SHOW`, found `{}`",
                variable.iter().format(" ")
            ))),
        },
        Statement::ShowTables { db_name, filter: None, .. } => {
            Ok(Request::ShowTables { database: db_name.map(|ident| Name::from(ident.value)) })
        }
        Statement::Use { db_name, .. } => Ok(Request::Use { database: Name::from(db_name.value) }),
        Statement::ExplainTable { table_name, .. } => {
            Ok(Request::Describe { table: lower_table_ref(&table_name)? })
        }
        Statement::Query(query) => lower_select(*query),
        Statement::Insert { table_name, columns, source, on: None, .. } => {
            if !columns.is_empty() {
                return Err(Error::Parse("column lists are not supported in `INSERT`".into()));
            }
            let table = lower_table_ref(&table_name)?;
            let source = *source;
            let mut rows = match *source.body {
                SetExpr::Values(values) => values.rows,
                body => return Err(unsupported("insert source", body)),
            };
            if rows.len() != 1 {
                return Err(Error::Parse(format!(
                    "expected a single row of values, found {}",
                    rows.len()
                )));
            }
            let values = rows.remove(0).into_iter().map(lower_slot).collect::<Result<_>>()?;
            Ok(Request::Insert { table, values })
        }
        statement => Err(unsupported("statement", statement)),
    }
}

fn lower_table_ref(name: &ObjectName) -> Result<TableRef> {
    match &name.0[..] {
        [table] => Ok(TableRef { database: None, table: Name::from(&table.value) }),
        [database, table] => Ok(TableRef {
            database: Some(Name::from(&database.value)),
            table: Name::from(&table.value),
        }),
        _ => Err(unsupported("table name", name)),
    }
}

/// Only `SELECT * FROM [db.]table [LIMIT n]` is understood.
fn lower_select(query: Query) -> Result<Request> {
    if query.with.is_some()
        || !query.order_by.is_empty()
        || query.offset.is_some()
        || query.fetch.is_some()
    {
        return Err(unsupported("query", query));
    }

    let limit = query.limit.as_ref().map(lower_limit).transpose()?;
    let select = match *query.body {
        SetExpr::Select(select) => select,
        body => return Err(unsupported("query", body)),
    };

    if !matches!(&select.projection[..], [SelectItem::Wildcard(_)])
        || select.selection.is_some()
        || select.having.is_some()
    {
        return Err(unsupported("query", &select));
    }

    let table = match &select.from[..] {
        [TableWithJoins { relation: TableFactor::Table { name, .. }, joins }]
            if joins.is_empty() =>
        {
            lower_table_ref(name)?
        }
        _ => return Err(unsupported("query", &select)),
    };

    Ok(Request::Select { table, limit })
}

fn lower_limit(expr: &Expr) -> Result<u64> {
    match expr {
        Expr::Value(ast::Value::Number(n, _)) => n.parse::<u64>().map_err(|_| {
            Error::Parse(format!("expected a non-negative integer limit, found `{n}`"))
        }),
        expr => Err(Error::Parse(format!("expected a non-negative integer limit, found `{expr}`"))),
    }
}

/// `DEFAULT` leaves the slot unset.
fn lower_slot(expr: Expr) -> Result<Option<Value>> {
    let value = match expr {
        Expr::Identifier(ident)
            if ident.quote_style.is_none() && ident.value.eq_ignore_ascii_case("default") =>
        {
            return Ok(None);
        }
        Expr::Value(value) => lower_value(value, false)?,
        Expr::UnaryOp { op: UnaryOperator::Minus, expr } => match *expr {
            Expr::Value(value @ ast::Value::Number(..)) => lower_value(value, true)?,
            expr => return Err(unsupported("value", expr)),
        },
        expr => return Err(unsupported("value", expr)),
    };
    Ok(Some(value))
}

fn lower_value(value: ast::Value, negate: bool) -> Result<Value> {
    match value {
        ast::Value::Null => Ok(Value::Null),
        ast::Value::Number(n, _) => parse_number(&n, negate),
        ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => Ok(Value::Text(s)),
        value => Err(unsupported("value", value)),
    }
}

/// Integers are unsigned 64-bit values, anything with a fraction or exponent is a float.
fn parse_number(n: &str, negate: bool) -> Result<Value> {
    if !n.contains(['.', 'e', 'E']) {
        if negate {
            return Err(Error::Parse(format!("negative integer `-{n}` is not supported")));
        }
        return n
            .parse::<u64>()
            .map(Value::UInt64)
            .map_err(|err| Error::Parse(format!("invalid integer `{n}`: {err}")));
    }

    let float =
        n.parse::<f64>().map_err(|err| Error::Parse(format!("invalid number `{n}`: {err}")))?;
    Ok(Value::Float64(if negate { -float } else { float }))
}
