use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use embsql_core::Error;

use crate::auth::Authenticator;

/// How and where a [`crate::Server`] listens, and who may connect.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tcp`, or `unix` on unix platforms.
    pub protocol: String,
    /// `host:port` for tcp, a socket path for unix.
    pub address: String,
    pub auth: Arc<dyn Authenticator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    #[cfg(unix)]
    Unix,
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            #[cfg(unix)]
            "unix" => Ok(Protocol::Unix),
            _ => Err(Error::Configuration(format!("unsupported protocol `{s}`"))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            #[cfg(unix)]
            Protocol::Unix => write!(f, "unix"),
        }
    }
}
