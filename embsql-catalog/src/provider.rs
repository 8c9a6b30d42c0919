use std::sync::Arc;

use embsql_core::{Name, Result};

use crate::set::CatalogSet;
use crate::{Database, Table};

/// The registry of databases a query engine is built on.
#[derive(Debug)]
pub struct Provider {
    databases: CatalogSet<dyn Database>,
}

impl Default for Provider {
    fn default() -> Self {
        Self { databases: CatalogSet::new("database") }
    }
}

impl Provider {
    /// Register `databases` in order, failing on the first duplicate name.
    pub fn new(databases: impl IntoIterator<Item = Arc<dyn Database>>) -> Result<Self> {
        let provider = Self::default();
        databases.into_iter().try_for_each(|db| provider.add_database(db))?;
        Ok(provider)
    }

    pub fn add_database(&self, database: Arc<dyn Database>) -> Result<()> {
        self.databases.insert(Name::clone(database.name()), database)
    }

    #[inline]
    pub fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        self.databases.get_or_not_found(name)
    }

    /// All databases in registration order.
    #[inline]
    pub fn databases(&self) -> Vec<Arc<dyn Database>> {
        self.databases.entries()
    }

    #[inline]
    pub fn database_names(&self) -> Vec<Name> {
        self.databases.names()
    }

    pub fn table(&self, database: &str, table: &str) -> Result<Arc<Table>> {
        self.database(database)?.table(self, table)
    }
}
