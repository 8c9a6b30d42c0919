use std::error::Error;
use std::fmt;

use chrono::NaiveDateTime;

use crate::{LogicalType, Name};

/// Formats accepted when text is coerced to a timestamp.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub struct CastError {
    value: Value,
    target: LogicalType,
}

impl CastError {
    pub fn new(value: Value, target: LogicalType) -> Self {
        Self { value, target }
    }

    #[inline]
    pub fn target(&self) -> LogicalType {
        self.target
    }
}

impl fmt::Debug for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot cast value {:?} of type {} to {}",
            self.value,
            self.value.ty(),
            self.target
        )
    }
}

impl Error for CastError {}

/// An embsql value
// Keep this in sync with `LogicalType`
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    NaiveDateTime => Timestamp,
}

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Name> for Value {
    #[inline]
    fn from(v: Name) -> Self {
        Self::Text(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Value {
    #[inline]
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Value::Null)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn cast<T: FromValue>(self) -> Result<Option<T>, CastError> {
        if self.is_null() {
            return Ok(None);
        }

        self.cast_non_null().map(Some)
    }

    #[inline]
    pub fn cast_non_null<T: FromValue>(self) -> Result<T, CastError> {
        T::from_value(self)
    }

    #[inline]
    pub fn ty(&self) -> LogicalType {
        match self {
            Value::Null => LogicalType::Null,
            Value::UInt8(_) => LogicalType::UInt8,
            Value::UInt16(_) => LogicalType::UInt16,
            Value::UInt32(_) => LogicalType::UInt32,
            Value::UInt64(_) => LogicalType::UInt64,
            Value::Float32(_) => LogicalType::Float32,
            Value::Float64(_) => LogicalType::Float64,
            Value::Text(_) => LogicalType::Text,
            Value::Timestamp(_) => LogicalType::Timestamp,
        }
    }

    #[inline]
    fn as_unsigned(&self) -> Option<u64> {
        match *self {
            Value::UInt8(i) => Some(i.into()),
            Value::UInt16(i) => Some(i.into()),
            Value::UInt32(i) => Some(i.into()),
            Value::UInt64(i) => Some(i),
            _ => None,
        }
    }

    /// Convert this value to `target` if that can be done without losing information.
    /// `Null` coerces to every type; nullability is the caller's concern.
    pub fn coerce(self, target: LogicalType) -> Result<Value, CastError> {
        if self.is_null() || self.ty() == target {
            return Ok(self);
        }

        if let Some(i) = self.as_unsigned() {
            let coerced = match target {
                LogicalType::UInt8 => u8::try_from(i).ok().map(Value::UInt8),
                LogicalType::UInt16 => u16::try_from(i).ok().map(Value::UInt16),
                LogicalType::UInt32 => u32::try_from(i).ok().map(Value::UInt32),
                LogicalType::UInt64 => Some(Value::UInt64(i)),
                LogicalType::Float32 => exact_f32(i).map(Value::Float32),
                LogicalType::Float64 => exact_f64(i).map(Value::Float64),
                _ => None,
            };
            return coerced.ok_or_else(|| CastError::new(self, target));
        }

        match (self, target) {
            (Value::Float32(f), LogicalType::Float64) => Ok(Value::Float64(f.into())),
            (Value::Text(s), LogicalType::Timestamp) => TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .map(Value::Timestamp)
                .ok_or_else(|| CastError::new(Value::Text(s), target)),
            (value, target) => Err(CastError::new(value, target)),
        }
    }
}

/// 2^64, the smallest float above `u64::MAX`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// `i` as a float, if the float represents it exactly.
fn exact_f64(i: u64) -> Option<f64> {
    let f = i as f64;
    (f < U64_LIMIT && f as u64 == i).then_some(f)
}

fn exact_f32(i: u64) -> Option<f32> {
    let f = i as f32;
    (f64::from(f) < U64_LIMIT && f as u64 == i).then_some(f)
}

impl fmt::Display for Value {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::UInt8(i) => write!(f, "{i}"),
            Value::UInt16(i) => write!(f, "{i}"),
            Value::UInt32(i) => write!(f, "{i}"),
            Value::UInt64(i) => write!(f, "{i}"),
            Value::Float32(x) => write!(f, "{x}"),
            Value::Float64(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

pub trait FromValue: Sized {
    /// Cast an embsql `value` to a rust value.
    fn from_value(value: Value) -> Result<Self, CastError>;
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, CastError> {
        value.as_unsigned().ok_or_else(|| CastError::new(value, LogicalType::UInt64))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value.coerce(LogicalType::Float64)? {
            Value::Float64(x) => Ok(x),
            value => Err(CastError::new(value, LogicalType::Float64)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Text(s) => Ok(s),
            _ => Err(CastError::new(value, LogicalType::Text)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value.coerce(LogicalType::Timestamp)? {
            Value::Timestamp(ts) => Ok(ts),
            value => Err(CastError::new(value, LogicalType::Timestamp)),
        }
    }
}

#[cfg(test)]
mod tests;
