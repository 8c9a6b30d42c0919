use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use embsql::Permissions;
use embsql_server::{Authenticator, StaticAuthenticator, UserTableAuthenticator};
use serde::Deserialize;

/// Daemon settings, read from an optional TOML file and overridden by command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub protocol: String,
    pub address: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table_prefix: String,
    pub tables: usize,
    /// Additional users. When present, `user` and `password` are added to this table.
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub access: Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
    #[default]
    All,
}

impl From<Access> for Permissions {
    fn from(access: Access) -> Self {
        match access {
            Access::Read => Permissions::READ,
            Access::Write => Permissions::WRITE,
            Access::All => Permissions::ALL,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            protocol: "tcp".into(),
            address: "localhost:3307".into(),
            user: "root".into(),
            password: "123456".into(),
            database: embsql::fixture::DATABASE_NAME.into(),
            table_prefix: embsql::fixture::TABLE_NAME_PREFIX.into(),
            tables: embsql::fixture::TABLE_COUNT,
            users: vec![],
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file `{}`", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file `{}`", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        if self.users.is_empty() {
            return Arc::new(StaticAuthenticator::new(&self.user, &self.password, Permissions::ALL));
        }

        let users = self
            .users
            .iter()
            .fold(UserTableAuthenticator::new(), |users, user| {
                users.with_user(&user.name, &user.password, user.access.into())
            })
            .with_user(&self.user, &self.password, Permissions::ALL);
        Arc::new(users)
    }
}
