//! Drives a root operator to completion.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use tracing::{debug, info};

use crate::error::Result;

use super::operator::{BoxedOperator, CallResult, Operator};
use super::process::Process;
use super::vectorized::Batch;

/// A prepared chain of operators, pulled from its root.
pub struct Pipeline {
    root: BoxedOperator,
}

impl Pipeline {
    /// Creates a pipeline over `root`.
    #[must_use]
    pub fn new(root: BoxedOperator) -> Self {
        Pipeline { root }
    }

    /// Returns the root operator.
    #[must_use]
    pub fn root(&self) -> &dyn Operator {
        self.root.as_ref()
    }

    /// Returns a one-line description of the operator chain.
    #[must_use]
    pub fn explain(&self) -> String {
        self.root.to_string()
    }

    /// Prepares the operators and feeds every produced batch to `sink`.
    ///
    /// Returns the number of rows produced. Cancellation is reported as
    /// `Error::Canceled` or `Error::QueryTimeout`.
    ///
    /// # Errors
    ///
    /// Propagates operator and sink errors unchanged.
    pub fn execute<F>(&mut self, proc: &Process, mut sink: F) -> Result<usize>
    where
        F: FnMut(&Batch) -> Result<()>,
    {
        let start = Instant::now();
        self.root.prepare(proc)?;

        let mut rows = 0;
        let mut batches = 0;
        loop {
            match self.root.call(proc)? {
                CallResult::Batch(batch) => {
                    rows += batch.row_count();
                    batches += 1;
                    sink(&*batch)?;
                }
                CallResult::End => break,
                CallResult::Canceled(reason) => {
                    debug!(query_id = %proc.query_id(), ?reason, rows, "pipeline canceled");
                    return Err(reason.into_error());
                }
            }
        }

        let elapsed = start.elapsed();
        if elapsed > proc.config().slow_threshold {
            info!(
                query_id = %proc.query_id(),
                pipeline = %self.explain(),
                rows,
                batches,
                ?elapsed,
                "slow pipeline"
            );
        }
        debug!(query_id = %proc.query_id(), rows, batches, ?elapsed, "pipeline finished");
        Ok(rows)
    }

    /// Runs the pipeline and collects its output as Arrow record batches.
    ///
    /// # Errors
    ///
    /// Propagates operator and conversion errors.
    pub fn collect(&mut self, proc: &Process) -> Result<Vec<RecordBatch>> {
        let mut out = Vec::new();
        self.execute(proc, |batch| {
            out.push(batch.to_record_batch()?);
            Ok(())
        })?;
        Ok(out)
    }

    /// Rewinds every operator and restarts the query deadline so the
    /// pipeline can be executed again.
    pub fn reset(&mut self, proc: &Process) {
        self.root.reset(proc);
        proc.restart_deadline();
    }

    /// Releases every operator's allocations.
    pub fn free(&mut self, proc: &Process) {
        self.root.free(proc);
    }
}
