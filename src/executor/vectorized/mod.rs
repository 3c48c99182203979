//! Vectorized execution module.
//!
//! This module provides the columnar storage and expression evaluation
//! primitives operators exchange, built on Apache Arrow buffers and kernels.

pub mod batch;
pub mod evaluator;
pub mod vector;

pub use batch::{Batch, SelectionVector, DEFAULT_BATCH_SIZE};
pub use evaluator::{EvalInput, VectorizedEvaluator};
pub use vector::{MemoryPoolRef, Vector, VectorClass};
