use std::collections::HashMap;
use std::fmt;

use embsql::{Permissions, Principal};
use embsql_core::{Error, Result};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("access denied for user `{0}`")]
    AccessDenied(String),
    #[error("malformed credentials: {0}")]
    Malformed(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Decides who may connect and what they may do once connected.
pub trait Authenticator: fmt::Debug + Send + Sync {
    /// Check the policy itself is well formed. Called once when the server is constructed.
    fn validate(&self) -> Result<()>;

    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// Usernames and passwords travel as whitespace separated words.
fn validate_user(username: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::Configuration("username must not be empty".into()));
    }

    if username.contains(char::is_whitespace) || password.contains(char::is_whitespace) {
        return Err(Error::Configuration(format!(
            "credentials of user `{username}` must not contain whitespace"
        )));
    }

    if password.is_empty() {
        return Err(Error::Configuration(format!("user `{username}` has an empty password")));
    }
    Ok(())
}

/// A single user with a fixed password and permission set.
pub struct StaticAuthenticator {
    username: String,
    password: String,
    permissions: Permissions,
}

impl fmt::Debug for StaticAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticAuthenticator")
            .field("username", &self.username)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl StaticAuthenticator {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        Self { username: username.into(), password: password.into(), permissions }
    }
}

impl Authenticator for StaticAuthenticator {
    fn validate(&self) -> Result<()> {
        validate_user(&self.username, &self.password)
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        if credentials.username != self.username || credentials.password != self.password {
            return Err(AuthError::AccessDenied(credentials.username.clone()));
        }
        Ok(Principal::new(&self.username, self.permissions))
    }
}

/// Any number of users, each with their own password and permission set.
#[derive(Default)]
pub struct UserTableAuthenticator {
    users: HashMap<String, (String, Permissions)>,
}

impl fmt::Debug for UserTableAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.users.keys()).finish()
    }
}

impl UserTableAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, replacing any previous user with the same name.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        self.users.insert(username.into(), (password.into(), permissions));
        self
    }
}

impl Authenticator for UserTableAuthenticator {
    fn validate(&self) -> Result<()> {
        if self.users.is_empty() {
            return Err(Error::Configuration("the user table is empty".into()));
        }
        self.users
            .iter()
            .try_for_each(|(username, (password, _))| validate_user(username, password))
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        match self.users.get(&credentials.username) {
            Some((password, permissions)) if *password == credentials.password => {
                Ok(Principal::new(&credentials.username, *permissions))
            }
            _ => Err(AuthError::AccessDenied(credentials.username.clone())),
        }
    }
}
