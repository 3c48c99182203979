//! The pull-based operator contract shared by every pipeline stage.
//!
//! An operator is prepared once per execution and then called repeatedly.
//! Each call polls cancellation first, then produces at most one batch:
//!
//! ```text
//! prepare(proc) ──► call(proc) ──► Batch | End | Canceled
//!                     ▲     │
//!                     └─────┘   (until End; End is idempotent)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

use super::analyzer::{Analyzer, OperatorAnalyzer, OperatorStats};
use super::process::{CancelReason, Process};
use super::project::Projection;
use super::vectorized::Batch;

/// Kinds of operators known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    ValueScan,
    Filter,
}

impl OpType {
    /// Stable operator name for explain output and logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OpType::ValueScan => "value_scan",
            OpType::Filter => "filter",
        }
    }
}

/// Outcome of one call.
#[derive(Debug, Clone)]
pub enum CallResult {
    /// A batch handed to the caller. Receivers must treat it as read-only.
    Batch(Arc<Batch>),
    /// No more data. Repeated calls keep returning `End`.
    End,
    /// Cancellation was observed before any work was done.
    Canceled(CancelReason),
}

impl CallResult {
    /// Returns the batch, if any.
    #[must_use]
    pub fn batch(&self) -> Option<&Arc<Batch>> {
        match self {
            CallResult::Batch(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, CallResult::End)
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, CallResult::Canceled(_))
    }
}

/// A pipeline stage.
pub trait Operator: fmt::Display + Send {
    /// Returns the operator kind.
    fn op_type(&self) -> OpType;

    /// Returns the shared operator state.
    fn base(&self) -> &OperatorBase;

    fn base_mut(&mut self) -> &mut OperatorBase;

    /// Builds per-execution state. Called once before the first `call` of
    /// every execution.
    fn prepare(&mut self, proc: &Process) -> Result<()>;

    /// Pulls at most one batch forward.
    fn call(&mut self, proc: &Process) -> Result<CallResult>;

    /// Rewinds the operator for a re-execution, keeping cached state.
    fn reset(&mut self, proc: &Process);

    /// Releases everything the operator allocated.
    fn free(&mut self, proc: &Process);
}

/// Boxed operator for dynamic dispatch.
pub type BoxedOperator = Box<dyn Operator>;

/// State common to all operators: position in the pipeline, output
/// projection and analyzer.
pub struct OperatorBase {
    pub idx: usize,
    pub is_first: bool,
    pub is_last: bool,
    projection: Option<Projection>,
    analyzer: Option<Box<dyn Analyzer>>,
}

impl OperatorBase {
    #[must_use]
    pub fn new(idx: usize, is_first: bool, is_last: bool) -> Self {
        OperatorBase {
            idx,
            is_first,
            is_last,
            projection: None,
            analyzer: None,
        }
    }

    /// Sets the declared output projection.
    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Installs an externally supplied analyzer.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Returns the projection, if any.
    #[must_use]
    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Creates the default analyzer on first use, or clears the existing one.
    pub fn prepare_analyzer(&mut self, name: &str) {
        match self.analyzer.as_mut() {
            Some(analyzer) => analyzer.reset(),
            None => {
                self.analyzer = Some(Box::new(OperatorAnalyzer::new(self.idx, name)));
            }
        }
    }

    /// Compiles the projection's expression executors.
    pub fn prepare_projection(&mut self, proc: &Process) -> Result<()> {
        match self.projection.as_mut() {
            Some(projection) => projection.prepare(proc),
            None => Ok(()),
        }
    }

    /// Applies the projection to a produced batch. Absent batches and
    /// operators without a projection pass through.
    pub fn eval_projection(
        &mut self,
        batch: Option<Arc<Batch>>,
        proc: &Process,
    ) -> Result<Option<Arc<Batch>>> {
        match (batch, self.projection.as_mut()) {
            (Some(batch), Some(projection)) => projection.eval(&batch, proc).map(Some),
            (batch, _) => Ok(batch),
        }
    }

    pub fn analyzer_start(&mut self) {
        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.start();
        }
    }

    pub fn analyzer_stop(&mut self) {
        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.stop();
        }
    }

    /// Records the pre- and post-projection batches of one call.
    pub fn analyzer_record(&mut self, input: Option<&Batch>, output: Option<&Batch>) {
        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.input(input);
            analyzer.output(output);
        }
    }

    /// Returns the analyzer counters, if an analyzer is installed.
    #[must_use]
    pub fn stats(&self) -> Option<OperatorStats> {
        self.analyzer.as_ref().map(|a| a.stats())
    }

    /// Drops the projection's compiled state.
    pub fn free(&mut self) {
        if let Some(projection) = self.projection.as_mut() {
            projection.free();
        }
    }
}

impl Default for OperatorBase {
    fn default() -> Self {
        OperatorBase::new(0, true, true)
    }
}

impl fmt::Debug for OperatorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorBase")
            .field("idx", &self.idx)
            .field("is_first", &self.is_first)
            .field("is_last", &self.is_last)
            .field("projection", &self.projection)
            .field("stats", &self.stats())
            .finish()
    }
}
