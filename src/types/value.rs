//! Value and `DataType` definitions for colexec.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width in bytes of a variable-width slot: a `u32` offset into the vector's
/// byte area followed by a `u32` length.
const VARLEN_SLOT_SIZE: usize = 8;

/// Supported column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Date (stored as days since epoch).
    Date,
    /// Timestamp (stored as microseconds since epoch).
    Timestamp,
}

impl DataType {
    /// Returns the SQL name of the data type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::Bool => "BOOL",
            DataType::String => "VARCHAR",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
        }
    }

    /// Returns whether this type is a fixed-width type.
    #[must_use]
    pub fn is_fixed_width(&self) -> bool {
        !matches!(self, DataType::String)
    }

    /// Returns the byte size for fixed-width types.
    #[must_use]
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            DataType::Int64 | DataType::Float64 | DataType::Timestamp => Some(8),
            DataType::Float32 | DataType::Date => Some(4),
            DataType::Bool => Some(1),
            DataType::String => None, // variable width
        }
    }

    /// Returns the width of one row slot in a vector's value buffer.
    ///
    /// Variable-width types store an (offset, length) pair per row.
    #[must_use]
    pub fn slot_width(&self) -> usize {
        self.byte_size().unwrap_or(VARLEN_SLOT_SIZE)
    }

    /// Converts to an Arrow data type.
    #[must_use]
    pub fn to_arrow(&self) -> arrow::datatypes::DataType {
        match self {
            DataType::Int64 => arrow::datatypes::DataType::Int64,
            DataType::Float32 => arrow::datatypes::DataType::Float32,
            DataType::Float64 => arrow::datatypes::DataType::Float64,
            DataType::Bool => arrow::datatypes::DataType::Boolean,
            DataType::String => arrow::datatypes::DataType::Utf8,
            DataType::Date => arrow::datatypes::DataType::Date32,
            DataType::Timestamp => {
                arrow::datatypes::DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, None)
            }
        }
    }

    /// Converts from an Arrow data type.
    ///
    /// Returns None for unsupported Arrow types. `Null` arrays map to
    /// `Int64`, the placeholder type for untyped nulls.
    #[must_use]
    pub fn from_arrow(arrow_type: &arrow::datatypes::DataType) -> Option<Self> {
        match arrow_type {
            arrow::datatypes::DataType::Int64 | arrow::datatypes::DataType::Null => {
                Some(DataType::Int64)
            }
            arrow::datatypes::DataType::Float32 => Some(DataType::Float32),
            arrow::datatypes::DataType::Float64 => Some(DataType::Float64),
            arrow::datatypes::DataType::Boolean => Some(DataType::Bool),
            arrow::datatypes::DataType::Utf8 => Some(DataType::String),
            arrow::datatypes::DataType::Date32 => Some(DataType::Date),
            arrow::datatypes::DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, _) => {
                Some(DataType::Timestamp)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value container for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer value.
    Int64(i64),
    /// 32-bit floating point value.
    Float32(f32),
    /// 64-bit floating point value.
    Float64(f64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    String(String),
    /// Date value (days since Unix epoch).
    Date(i32),
    /// Timestamp value (microseconds since Unix epoch).
    Timestamp(i64),
    /// Null value.
    Null,
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float32(_) => Some(DataType::Float32),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::String(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) | Value::Timestamp(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{v}'"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_width() {
        assert_eq!(DataType::Int64.slot_width(), 8);
        assert_eq!(DataType::Bool.slot_width(), 1);
        assert_eq!(DataType::String.slot_width(), VARLEN_SLOT_SIZE);
    }

    #[test]
    fn test_arrow_roundtrip_types() {
        for dt in [
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Bool,
            DataType::String,
            DataType::Date,
            DataType::Timestamp,
        ] {
            assert_eq!(DataType::from_arrow(&dt.to_arrow()), Some(dt));
        }
    }

    #[test]
    fn test_null_arrow_type_is_int64_placeholder() {
        assert_eq!(
            DataType::from_arrow(&arrow::datatypes::DataType::Null),
            Some(DataType::Int64)
        );
    }
}
