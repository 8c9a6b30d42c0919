#![deny(rust_2018_idioms)]
//! A small query engine over an [`embsql_catalog::Provider`].

pub mod fixture;
pub mod request;
mod session;

use std::sync::atomic::{self, AtomicU64};
use std::sync::Arc;

use embsql_catalog::{Database, EvalContext, Provider, Table};
pub use embsql_core::{Error, LogicalType, Name, Result, Row, Value};

pub use self::request::{Request, TableRef};
pub use self::session::{Permissions, Principal, Session};

/// The rows produced by a request, along with the name and type of each column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterializedQueryOutput {
    pub columns: Vec<Name>,
    pub types: Vec<LogicalType>,
    pub rows: Vec<Row>,
}

impl MaterializedQueryOutput {
    fn text(columns: &[&str], rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            columns: columns.iter().map(Name::from).collect(),
            types: vec![LogicalType::Text; columns.len()],
            rows: rows.into_iter().collect(),
        }
    }

    fn from_table(table: &Table, rows: Vec<Row>) -> Self {
        let columns = table.schema().columns();
        Self {
            columns: columns.iter().map(|column| Name::clone(column.name())).collect(),
            types: columns.iter().map(|column| column.logical_type()).collect(),
            rows,
        }
    }
}

/// Executes requests on behalf of authenticated sessions.
pub trait QueryEngine: Send + Sync {
    fn connect(&self, principal: Principal) -> Session;

    fn execute(&self, session: &mut Session, request: &str) -> Result<MaterializedQueryOutput>;
}

#[derive(Debug)]
pub struct Engine {
    provider: Arc<Provider>,
    next_session_id: AtomicU64,
}

impl Engine {
    pub fn new(provider: Arc<Provider>) -> Self {
        Self { provider, next_session_id: AtomicU64::new(1) }
    }

    #[inline]
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    fn database_name<'a>(
        &self,
        session: &'a Session,
        database: Option<&'a Name>,
    ) -> Result<&'a Name> {
        database.or(session.current_database()).ok_or(Error::NoDatabaseSelected)
    }

    fn table(
        &self,
        session: &Session,
        table: &TableRef,
    ) -> Result<(Arc<dyn Database>, Arc<Table>)> {
        let database = self.database_name(session, table.database.as_ref())?;
        let database = self.provider.database(database)?;
        let table = database.table(&self.provider, &table.table)?;
        Ok((database, table))
    }

    pub fn execute_request(
        &self,
        session: &mut Session,
        request: Request,
    ) -> Result<MaterializedQueryOutput> {
        let required = match request {
            Request::Insert { .. } => Permissions::WRITE,
            _ => Permissions::READ,
        };
        session.principal().check(required)?;

        match request {
            Request::ShowDatabases => {
                let names = self.provider.database_names();
                Ok(MaterializedQueryOutput::text(
                    &["database"],
                    names.into_iter().map(|name| Row::from([Value::from(name)])),
                ))
            }
            Request::ShowTables { database } => {
                let database = self.database_name(session, database.as_ref())?;
                let db = self.provider.database(database)?;
                let column = format!("tables_in_{database}");
                Ok(MaterializedQueryOutput::text(
                    &[column.as_str()],
                    db.table_names(&self.provider)
                        .into_iter()
                        .map(|name| Row::from([Value::from(name)])),
                ))
            }
            Request::Use { database } => {
                self.provider.database(&database)?;
                tracing::debug!(session = session.id(), %database, "changed database");
                session.set_current_database(database);
                Ok(MaterializedQueryOutput::default())
            }
            Request::Describe { table } => {
                let (_, table) = self.table(session, &table)?;
                Ok(describe(&table))
            }
            Request::Select { table, limit } => {
                let (_, table) = self.table(session, &table)?;
                let limit = limit.map(|limit| usize::try_from(limit).unwrap_or(usize::MAX));
                Ok(MaterializedQueryOutput::from_table(&table, table.scan(limit)))
            }
            Request::Insert { table: table_ref, values } => {
                let (database, table) = self.table(session, &table_ref)?;
                if database.is_read_only() {
                    return Err(Error::PermissionDenied(format!(
                        "database `{}` is read-only",
                        database.name()
                    )));
                }
                let row = table.insert(&EvalContext::now(), values)?;
                Ok(MaterializedQueryOutput::from_table(&table, vec![row]))
            }
        }
    }
}

/// One row per column: name, type, nullability, key, default and extra attributes.
fn describe(table: &Table) -> MaterializedQueryOutput {
    let rows = table.schema().columns().iter().map(|column| {
        Row::from([
            Value::from(Name::clone(column.name())),
            Value::from(column.logical_type().to_string()),
            Value::from(if column.is_nullable() { "YES" } else { "NO" }),
            Value::from(if column.is_primary_key() { "PRI" } else { "" }),
            Value::from(column.default().map(|default| default.to_string())),
            Value::from(if column.is_auto_increment() { "auto_increment" } else { "" }),
        ])
    });
    MaterializedQueryOutput::text(&["field", "type", "null", "key", "default", "extra"], rows)
}

impl QueryEngine for Engine {
    fn connect(&self, principal: Principal) -> Session {
        let id = self.next_session_id.fetch_add(1, atomic::Ordering::Relaxed);
        tracing::debug!(session = id, user = principal.username(), "session opened");
        Session::new(id, principal)
    }

    #[tracing::instrument(
        skip(self, session),
        fields(session = session.id(), user = session.principal().username())
    )]
    fn execute(&self, session: &mut Session, request: &str) -> Result<MaterializedQueryOutput> {
        let request = request::parse(request)?;
        self.execute_request(session, request)
    }
}
