use std::fmt;

use embsql_core::{Error, Name, Result, Row, Value};
use parking_lot::RwLock;

use crate::{EvalContext, Schema};

/// An in-memory table: a fixed schema and an append-only sequence of rows.
pub struct Table {
    name: Name,
    schema: Schema,
    data: RwLock<TableData>,
}

struct TableData {
    rows: Vec<Row>,
    /// The last value assigned to the auto-increment column.
    counter: u64,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Table {
    pub fn new(name: impl Into<Name>, schema: Schema) -> Self {
        let counter = schema.initial_counter();
        Self { name: name.into(), schema, data: RwLock::new(TableData { rows: vec![], counter }) }
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.read().rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the rows in insertion order.
    #[inline]
    pub fn rows(&self) -> Vec<Row> {
        self.scan(None)
    }

    pub fn scan(&self, limit: Option<usize>) -> Vec<Row> {
        let data = self.data.read();
        data.rows.iter().take(limit.unwrap_or(usize::MAX)).cloned().collect()
    }

    /// The value the next insert will assign to the auto-increment column.
    pub fn next_auto_increment(&self) -> Option<u64> {
        self.schema.auto_increment_column()?;
        self.data.read().counter.checked_add(1)
    }

    /// Insert a row given one slot per column, where `None` means the value was not supplied.
    ///
    /// Unset slots take the column default (evaluated against `ctx`) or `NULL` if the column is
    /// nullable. The auto-increment column is always assigned by the table and any supplied
    /// value is ignored. Either the whole row is appended or the table is left untouched.
    pub fn insert(
        &self,
        ctx: &EvalContext,
        slots: impl IntoIterator<Item = Option<Value>>,
    ) -> Result<Row> {
        let slots = slots.into_iter().collect::<Vec<_>>();
        if slots.len() != self.schema.len() {
            return Err(Error::Type(format!(
                "table `{}` has {} columns but {} values were supplied",
                self.name,
                self.schema.len(),
                slots.len()
            )));
        }

        // the counter must not move between reading it and appending the row
        let mut data = self.data.write();
        let mut assigned = None;
        let mut values = Vec::with_capacity(slots.len());

        for (column, slot) in self.schema.columns().iter().zip(slots) {
            let name = column.name();
            let ty = column.logical_type();

            if column.is_auto_increment() {
                let next = data
                    .counter
                    .checked_add(1)
                    .ok_or_else(|| Error::constraint(name, "auto-increment counter exhausted"))?;
                let value = Value::UInt64(next).coerce(ty).map_err(|_| {
                    Error::constraint(name, format!("auto-increment value {next} overflows {ty}"))
                })?;
                assigned = Some(next);
                values.push(value);
                continue;
            }

            let value = match slot {
                Some(value) => value,
                None => match column.default() {
                    Some(default) => default.resolve(ctx)?,
                    None if column.is_nullable() => Value::Null,
                    None => {
                        return Err(Error::constraint(
                            name,
                            "no value was supplied and the column has no default",
                        ));
                    }
                },
            };

            if value.is_null() && !column.is_nullable() {
                return Err(Error::constraint(name, "null value in non-nullable column"));
            }

            values.push(value.coerce(ty).map_err(|err| {
                Error::Type(format!("column `{}`.`{name}`: {err}", self.name))
            })?);
        }

        let row = Row::new(values);
        if let Some(next) = assigned {
            data.counter = next;
        }
        data.rows.push(row.clone());
        tracing::trace!(table = %self.name, ?row, "inserted row");
        Ok(row)
    }
}
