use crate::value::CastError;
use crate::Name;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed schema, default expression, or server configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("constraint violation on column `{column}`: {reason}")]
    ConstraintViolation { column: Name, reason: String },
    #[error("type error: {0}")]
    Type(String),
    #[error("{kind} `{name}` already exists")]
    DuplicateName { kind: &'static str, name: Name },
    #[error("{kind} `{name}` does not exist")]
    NotFound { kind: &'static str, name: Name },
    #[error("no database selected")]
    NoDatabaseSelected,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CastError> for Error {
    #[inline]
    fn from(err: CastError) -> Self {
        Error::Type(err.to_string())
    }
}

impl Error {
    #[inline]
    pub fn constraint(column: &Name, reason: impl Into<String>) -> Self {
        Error::ConstraintViolation { column: Name::clone(column), reason: reason.into() }
    }
}
