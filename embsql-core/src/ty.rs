use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The declared type of a column.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum LogicalType {
    /// The type of the null value. Never a column type.
    Null,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    Timestamp,
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uint8" | "tinyint unsigned" => Ok(Self::UInt8),
            "uint16" | "smallint unsigned" => Ok(Self::UInt16),
            "uint32" | "int unsigned" => Ok(Self::UInt32),
            "uint64" | "bigint unsigned" => Ok(Self::UInt64),
            "float" | "float32" => Ok(Self::Float32),
            "double" | "float64" => Ok(Self::Float64),
            "text" => Ok(Self::Text),
            "timestamp" => Ok(Self::Timestamp),
            _ => Err(Error::Parse(format!("unknown type `{s}`"))),
        }
    }
}

impl LogicalType {
    #[inline]
    pub fn is_unsigned_integer(self) -> bool {
        self.max_unsigned().is_some()
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, LogicalType::Float32 | LogicalType::Float64)
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }

    /// The largest value representable by an unsigned integer type.
    #[inline]
    pub fn max_unsigned(self) -> Option<u64> {
        match self {
            LogicalType::UInt8 => Some(u8::MAX.into()),
            LogicalType::UInt16 => Some(u16::MAX.into()),
            LogicalType::UInt32 => Some(u32::MAX.into()),
            LogicalType::UInt64 => Some(u64::MAX),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Null => write!(f, "null"),
            LogicalType::UInt8 => write!(f, "uint8"),
            LogicalType::UInt16 => write!(f, "uint16"),
            LogicalType::UInt32 => write!(f, "uint32"),
            LogicalType::UInt64 => write!(f, "uint64"),
            LogicalType::Float32 => write!(f, "float32"),
            LogicalType::Float64 => write!(f, "float64"),
            LogicalType::Text => write!(f, "text"),
            LogicalType::Timestamp => write!(f, "timestamp"),
        }
    }
}
