use std::fmt;
use std::sync::Arc;

use embsql_core::{Name, Result};

use crate::set::CatalogSet;
use crate::{Provider, Table};

/// A named collection of tables exposed through a [`Provider`].
///
/// Virtual databases compute their tables on lookup, which is why lookups receive the provider
/// they are registered in.
pub trait Database: fmt::Debug + Send + Sync {
    fn name(&self) -> &Name;

    fn table_names(&self, provider: &Provider) -> Vec<Name>;

    fn table(&self, provider: &Provider, name: &str) -> Result<Arc<Table>>;

    /// Whether rows can be inserted into this database's tables.
    fn is_read_only(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct MemoryDatabase {
    name: Name,
    tables: CatalogSet<Table>,
}

impl MemoryDatabase {
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), tables: CatalogSet::new("table") }
    }

    /// Register `table` under its own name.
    /// Fails with [`embsql_core::Error::DuplicateName`] if the name is taken.
    pub fn add_table(&self, table: Table) -> Result<Arc<Table>> {
        let table = Arc::new(table);
        self.tables.insert(Name::clone(table.name()), Arc::clone(&table))?;
        Ok(table)
    }

    #[inline]
    pub fn get_table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name)
    }

    /// All tables in registration order.
    #[inline]
    pub fn tables(&self) -> Vec<Arc<Table>> {
        self.tables.entries()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Database for MemoryDatabase {
    #[inline]
    fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    fn table_names(&self, _provider: &Provider) -> Vec<Name> {
        self.tables.names()
    }

    #[inline]
    fn table(&self, _provider: &Provider, name: &str) -> Result<Arc<Table>> {
        self.tables.get_or_not_found(name)
    }
}
