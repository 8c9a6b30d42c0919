use embsql_core::{Error, Name, Result};
use itertools::Itertools;

bitflags::bitflags! {
    /// What an authenticated principal may do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        /// Listing databases and tables, describing and scanning tables.
        const READ = 0b0000_0001;
        /// Inserting rows.
        const WRITE = 0b0000_0010;
        const ALL = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Permissions {
    /// Fails with [`Error::PermissionDenied`] unless every flag in `required` is granted.
    pub fn check(self, username: &str, required: Permissions) -> Result<()> {
        if self.contains(required) {
            return Ok(());
        }

        let missing = required.difference(self).iter_names().map(|(name, _)| name).join(", ");
        Err(Error::PermissionDenied(format!("user `{username}` lacks {missing} permission")))
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    permissions: Permissions,
}

impl Principal {
    pub fn new(username: impl Into<String>, permissions: Permissions) -> Self {
        Self { username: username.into(), permissions }
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    #[inline]
    pub fn check(&self, required: Permissions) -> Result<()> {
        self.permissions.check(&self.username, required)
    }
}

/// Per-connection state.
#[derive(Debug)]
pub struct Session {
    id: u64,
    principal: Principal,
    current_database: Option<Name>,
}

impl Session {
    pub(crate) fn new(id: u64, principal: Principal) -> Self {
        Self { id, principal, current_database: None }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The database selected by `USE`, if any.
    #[inline]
    pub fn current_database(&self) -> Option<&Name> {
        self.current_database.as_ref()
    }

    pub(crate) fn set_current_database(&mut self, database: Name) {
        self.current_database = Some(database);
    }
}
