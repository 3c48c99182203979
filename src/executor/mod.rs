//! Executor module for query execution.
//!
//! Operators follow a pull model: the consumer prepares an operator once per
//! execution and then calls it until it reports end of data. Data flows as
//! columnar [`Batch`]es whose vectors allocate from the query's memory pool.

pub mod analyzer;
pub mod expr;
pub mod expr_executor;
pub mod filter;
pub mod operator;
pub mod pipeline;
pub mod process;
pub mod project;
pub mod rowset;
pub mod value_scan;
pub mod vectorized;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use self::vectorized::DEFAULT_BATCH_SIZE;

pub use analyzer::{Analyzer, OperatorAnalyzer, OperatorStats};
pub use expr::{ArithmeticOp, ComparisonOp, Expr, LogicalOp};
pub use expr_executor::ExpressionExecutor;
pub use filter::Filter;
pub use operator::{BoxedOperator, CallResult, OpType, Operator, OperatorBase};
pub use pipeline::Pipeline;
pub use process::{CancelHandle, CancelReason, Process};
pub use project::Projection;
pub use rowset::{FillMode, RowsetCell, RowsetColumn, RowsetDescriptor};
pub use value_scan::{ValueScan, ValueScanState};
pub use vectorized::{Batch, SelectionVector, Vector, VectorClass};

/// Default threshold above which materialization steps are logged as slow.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(1);

/// Configuration for the query executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of rows per batch for vectorized execution.
    pub batch_size: usize,
    /// Memory limit in bytes (0 = unlimited).
    pub memory_limit: usize,
    /// Fill discipline for value scans that do not set their own.
    pub fill_mode: FillMode,
    /// Materialization steps slower than this are logged at `info`.
    pub slow_threshold: Duration,
    /// Wall-clock budget for one execution.
    pub query_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            memory_limit: 0,
            fill_mode: FillMode::default(),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            query_timeout: None,
        }
    }
}

impl ExecutorConfig {
    /// Creates a new executor configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the memory limit in bytes.
    #[must_use]
    pub fn with_memory_limit(mut self, memory_limit: usize) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Sets the default fill discipline.
    #[must_use]
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    /// Sets the slow-step logging threshold.
    #[must_use]
    pub fn with_slow_threshold(mut self, slow_threshold: Duration) -> Self {
        self.slow_threshold = slow_threshold;
        self
    }

    /// Sets the query timeout.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}
