//! Scalar types shared by vectors and expressions.

mod value;

pub use value::{DataType, Value};
