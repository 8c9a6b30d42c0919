use std::sync::Arc;

use embsql_core::{Error, Name, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// A set of named catalog entries that preserves registration order.
#[derive(Debug)]
pub(crate) struct CatalogSet<T: ?Sized> {
    desc: &'static str,
    entries: RwLock<IndexMap<Name, Arc<T>>>,
}

impl<T: ?Sized> CatalogSet<T> {
    pub(crate) fn new(desc: &'static str) -> Self {
        Self { desc, entries: Default::default() }
    }

    pub(crate) fn insert(&self, name: Name, value: Arc<T>) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(Error::DuplicateName { kind: self.desc, name });
        }

        tracing::debug!(kind = self.desc, %name, "registered catalog entry");
        entries.insert(name, value);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.read().get(&Name::from(name)).map(Arc::clone)
    }

    pub(crate) fn get_or_not_found(&self, name: &str) -> Result<Arc<T>> {
        self.get(name).ok_or_else(|| Error::NotFound { kind: self.desc, name: name.into() })
    }

    pub(crate) fn names(&self) -> Vec<Name> {
        self.entries.read().keys().cloned().collect()
    }

    pub(crate) fn entries(&self) -> Vec<Arc<T>> {
        self.entries.read().values().map(Arc::clone).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
