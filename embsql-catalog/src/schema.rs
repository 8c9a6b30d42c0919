use std::collections::HashSet;

use embsql_core::{Error, Name, Result, Value};

use crate::Column;

/// The ordered, immutable column definitions of a table.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Box<[Column]>,
    auto_increment: Option<usize>,
    initial_counter: u64,
}

impl Schema {
    /// Validate and build a schema.
    ///
    /// Fails with [`Error::Configuration`] when:
    /// - there are no columns, or two columns share a name;
    /// - a column is declared with the `null` type;
    /// - more than one column is auto-increment;
    /// - an auto-increment column is not an unsigned integer primary key, or also has a default;
    /// - a default's type differs from its column's type;
    /// - a non-nullable column defaults to null.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        let columns = columns.into_iter().collect::<Box<[_]>>();
        if columns.is_empty() {
            return Err(Error::Configuration("a schema requires at least one column".into()));
        }

        let mut names = HashSet::with_capacity(columns.len());
        let mut auto_increment = None;
        for (idx, column) in columns.iter().enumerate() {
            let name = column.name();
            if !names.insert(name) {
                return Err(Error::Configuration(format!("duplicate column name `{name}`")));
            }

            if column.logical_type().is_null() {
                return Err(Error::Configuration(format!("column `{name}` cannot have type null")));
            }

            if let Some(default) = column.default() {
                if default.logical_type() != column.logical_type() {
                    return Err(Error::Configuration(format!(
                        "default `{default}` of column `{name}` has type {}, expected {}",
                        default.logical_type(),
                        column.logical_type()
                    )));
                }

                let defaults_to_null = default.expr().as_literal().is_some_and(Value::is_null);
                if defaults_to_null && !column.is_nullable() {
                    return Err(Error::Configuration(format!(
                        "non-nullable column `{name}` cannot default to null"
                    )));
                }
            }

            if !column.is_auto_increment() {
                continue;
            }

            if let Some(prev) = auto_increment.replace(idx) {
                let prev: &Column = &columns[prev];
                return Err(Error::Configuration(format!(
                    "only one auto-increment column is allowed, found `{}` and `{name}`",
                    prev.name()
                )));
            }

            if !column.is_primary_key() {
                return Err(Error::Configuration(format!(
                    "auto-increment column `{name}` must be part of the primary key"
                )));
            }

            if !column.logical_type().is_unsigned_integer() {
                return Err(Error::Configuration(format!(
                    "auto-increment column `{name}` must have an unsigned integer type, found {}",
                    column.logical_type()
                )));
            }

            if column.default().is_some() {
                return Err(Error::Configuration(format!(
                    "auto-increment column `{name}` cannot have a default"
                )));
            }
        }

        Ok(Self { columns, auto_increment, initial_counter: 0 })
    }

    /// Set the counter the auto-increment column starts from.
    /// The first inserted row receives `counter + 1`.
    #[inline]
    pub fn with_initial_counter(mut self, counter: u64) -> Self {
        self.initial_counter = counter;
        self
    }

    #[inline]
    pub fn initial_counter(&self) -> u64 {
        self.initial_counter
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        let name = Name::from(name);
        self.columns.iter().enumerate().find(|(_, column)| column.name() == &name)
    }

    /// The index of the auto-increment column, if there is one.
    #[inline]
    pub fn auto_increment_column(&self) -> Option<usize> {
        self.auto_increment
    }

    #[inline]
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.is_primary_key())
    }
}
