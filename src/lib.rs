//! colexec - pull-based vectorized operator pipeline
//!
//! Operators exchange columnar batches whose vectors account every byte on a
//! shared `DataFusion` memory pool. The leaf [`ValueScan`] materializes literal
//! row sets (`VALUES` lists, `SELECT` without `FROM`) into a batch once per
//! execution and serves it to downstream operators.
//!
//! ```
//! use colexec::{DataType, Expr, Pipeline, Process, RowsetDescriptor, ValueScan};
//!
//! let rows = vec![vec![Expr::lit(1i64), Expr::lit("a")], vec![Expr::lit(2i64), Expr::lit("b")]];
//! let desc = RowsetDescriptor::from_rows(&[DataType::Int64, DataType::String], rows)?;
//! let proc = Process::default();
//! let mut pipeline = Pipeline::new(Box::new(ValueScan::from_rowset(desc)));
//! let batches = pipeline.collect(&proc)?;
//! assert_eq!(batches[0].num_rows(), 2);
//! # Ok::<(), colexec::Error>(())
//! ```

pub mod error;
pub mod executor;
pub mod types;

pub use error::{Error, Result};
pub use executor::{
    Analyzer, Batch, BoxedOperator, CallResult, CancelHandle, CancelReason, ExecutorConfig, Expr,
    ExpressionExecutor, FillMode, Filter, Operator, OperatorBase, Pipeline, Process, Projection,
    RowsetColumn, RowsetDescriptor, ValueScan, ValueScanState, Vector,
};
pub use types::{DataType, Value};
