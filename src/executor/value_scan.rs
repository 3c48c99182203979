//! Value scan: materializes literal row sets into a batch and serves it.
//!
//! The operator has three sources:
//!
//! - no descriptor (or one without columns): a single one-row batch with a
//!   constant-null `BIGINT` column, used by `SELECT` without `FROM`;
//! - a [`RowsetDescriptor`]: every cell expression is compiled once into an
//!   executor table indexed by (column, cell), evaluated against the
//!   constant-folding input on every prepare, and written into one batch;
//! - pre-built batches handed in by the caller, served as-is.
//!
//! Re-preparing a rowset scan re-evaluates every cell (parameters may have
//! been rebound) and rebuilds the batch in place. A batch still held by a
//! consumer is left to it and a new one is allocated. A failed prepare leaves
//! the scan uninitialized, so the partly rebuilt batch is never served.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::types::DataType;

use super::expr_executor::ExpressionExecutor;
use super::operator::{CallResult, OpType, Operator, OperatorBase};
use super::process::Process;
use super::project::Projection;
use super::rowset::{FillMode, RowsetCell, RowsetDescriptor};
use super::vectorized::{Batch, Vector};

const OP_NAME: &str = "value_scan";

/// Lifecycle of a [`ValueScan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueScanState {
    Uninitialized,
    Prepared,
    Serving,
    Exhausted,
}

/// Leaf operator producing batches from literal data.
pub struct ValueScan {
    base: OperatorBase,
    rowset: Option<RowsetDescriptor>,
    fill_mode: Option<FillMode>,
    /// Batches supplied by the caller instead of materialized from a rowset.
    prebuilt: bool,
    batches: Vec<Arc<Batch>>,
    /// One executor per cell, per column.
    expr_exec_lists: Option<Vec<Vec<ExpressionExecutor>>>,
    expr_exec_builds: usize,
    cursor: usize,
    state: ValueScanState,
}

impl ValueScan {
    /// Creates a scan over a rowset, or the one-row literal scan for `None`.
    #[must_use]
    pub fn new(rowset: Option<RowsetDescriptor>) -> Self {
        ValueScan {
            base: OperatorBase::default(),
            rowset,
            fill_mode: None,
            prebuilt: false,
            batches: Vec::new(),
            expr_exec_lists: None,
            expr_exec_builds: 0,
            cursor: 0,
            state: ValueScanState::Uninitialized,
        }
    }

    /// The one-row, one-null-column scan.
    #[must_use]
    pub fn literal() -> Self {
        ValueScan::new(None)
    }

    /// Scan over literal rows.
    #[must_use]
    pub fn from_rowset(rowset: RowsetDescriptor) -> Self {
        ValueScan::new(Some(rowset))
    }

    /// Scan that serves already materialized batches in order.
    #[must_use]
    pub fn from_batches(batches: Vec<Batch>) -> Self {
        ValueScan {
            prebuilt: true,
            batches: batches.into_iter().map(Arc::new).collect(),
            ..ValueScan::new(None)
        }
    }

    /// Scan over an Arrow record batch, split into batches of at most
    /// `batch_size` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a column type has no vector counterpart or the
    /// memory pool is exhausted.
    pub fn from_record_batch(batch: &RecordBatch, proc: &Process) -> Result<Self> {
        let size = proc.config().batch_size.max(1);
        let mut batches = Vec::with_capacity(batch.num_rows().div_ceil(size));
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = size.min(batch.num_rows() - offset);
            batches.push(Batch::from_record_batch(&batch.slice(offset, len), proc.mp())?);
            offset += len;
        }
        Ok(ValueScan::from_batches(batches))
    }

    /// Overrides the fill discipline taken from the executor configuration.
    #[must_use]
    pub fn with_fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = Some(mode);
        self
    }

    /// Sets the pipeline position, projection and analyzer.
    #[must_use]
    pub fn with_base(mut self, base: OperatorBase) -> Self {
        self.base = base;
        self
    }

    /// Sets the output projection.
    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self {
        let base = std::mem::take(&mut self.base);
        self.base = base.with_projection(projection);
        self
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ValueScanState {
        self.state
    }

    /// Returns the rowset descriptor, if any.
    #[must_use]
    pub fn rowset(&self) -> Option<&RowsetDescriptor> {
        self.rowset.as_ref()
    }

    /// Returns the materialized batches.
    #[must_use]
    pub fn batches(&self) -> &[Arc<Batch>] {
        &self.batches
    }

    /// Returns how many times the executor table has been built.
    #[must_use]
    pub fn expr_exec_builds(&self) -> usize {
        self.expr_exec_builds
    }

    /// Drops the executor table so the next prepare recompiles every cell.
    pub fn invalidate_executors(&mut self) {
        self.expr_exec_lists = None;
    }

    /// Returns the fill discipline in effect for `proc`.
    #[must_use]
    pub fn fill_mode(&self, proc: &Process) -> FillMode {
        self.fill_mode.unwrap_or(proc.config().fill_mode)
    }

    fn make_value_scan_batch(&mut self, proc: &Process) -> Result<()> {
        let mode = self.fill_mode(proc);
        let Some(rowset) = self.rowset.as_ref().filter(|r| r.col_count() > 0) else {
            if self.batches.is_empty() {
                let vec = Vector::new_const_null(DataType::Int64, 1, proc.mp());
                self.batches.push(Arc::new(Batch::new(vec![vec], 1)));
            }
            return Ok(());
        };
        rowset.validate(mode)?;

        if self.expr_exec_lists.is_none() {
            let start = Instant::now();
            self.expr_exec_lists = Some(build_expr_exec_lists(proc, rowset)?);
            self.expr_exec_builds += 1;
            let elapsed = start.elapsed();
            if elapsed > proc.config().slow_threshold {
                info!(
                    query_id = %proc.query_id(),
                    idx = self.base.idx,
                    cells = rowset.cell_count(),
                    ?elapsed,
                    "slow value scan executor build"
                );
            }
        }
        let Some(lists) = self.expr_exec_lists.as_mut() else {
            return Err(Error::OperatorState("executor table missing".into()));
        };

        if self.batches.first_mut().and_then(Arc::get_mut).is_none() {
            if !self.batches.is_empty() {
                debug!(
                    query_id = %proc.query_id(),
                    idx = self.base.idx,
                    "value scan batch still held downstream, allocating a new one"
                );
            }
            let bat = Batch::allocate(&rowset.types(), rowset.row_count, proc.mp())?;
            self.batches = vec![Arc::new(bat)];
        }
        let Some(bat) = self.batches.first_mut().and_then(Arc::get_mut) else {
            return Err(Error::OperatorState("value scan batch is shared".into()));
        };

        let start = Instant::now();
        for (i, (col, execs)) in rowset.cols.iter().zip(lists.iter_mut()).enumerate() {
            let vec = bat
                .vector_mut(i)
                .ok_or_else(|| Error::OperatorState(format!("value scan batch lacks column {i}")))?;
            if execs.is_empty() {
                vec.reset_nulls(rowset.row_count)?;
                continue;
            }
            match mode {
                FillMode::Positional => {
                    eval_rowset_positional(proc, &col.cells, execs, vec, rowset.row_count)?;
                }
                FillMode::Append => eval_rowset_append(proc, execs, vec)?,
            }
        }
        bat.set_row_count(rowset.row_count);
        bat.validate()?;

        let elapsed = start.elapsed();
        if elapsed > proc.config().slow_threshold {
            info!(
                query_id = %proc.query_id(),
                idx = self.base.idx,
                rows = rowset.row_count,
                cols = rowset.col_count(),
                ?elapsed,
                "slow value scan rowset evaluation"
            );
        }
        debug!(
            query_id = %proc.query_id(),
            idx = self.base.idx,
            rows = rowset.row_count,
            cols = rowset.col_count(),
            ?mode,
            "materialized value scan batch"
        );
        Ok(())
    }

    /// Hands out the next batch after projection and records it.
    fn serve(&mut self, proc: &Process) -> Result<CallResult> {
        let input = match self.batches.get(self.cursor) {
            Some(batch) => {
                self.cursor += 1;
                self.state = ValueScanState::Serving;
                Some(Arc::clone(batch))
            }
            None => {
                self.state = ValueScanState::Exhausted;
                None
            }
        };
        let output = self.base.eval_projection(input.clone(), proc)?;
        self.base.analyzer_record(input.as_deref(), output.as_deref());
        Ok(match output {
            Some(batch) => CallResult::Batch(batch),
            None => CallResult::End,
        })
    }
}

fn build_expr_exec_lists(
    proc: &Process,
    rowset: &RowsetDescriptor,
) -> Result<Vec<Vec<ExpressionExecutor>>> {
    rowset
        .cols
        .iter()
        .map(|col| {
            col.cells
                .iter()
                .map(|cell| ExpressionExecutor::new(proc, &cell.expr))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Writes each cell at its declared row of a vector pre-sized to all nulls.
fn eval_rowset_positional(
    proc: &Process,
    cells: &[RowsetCell],
    execs: &mut [ExpressionExecutor],
    vec: &mut Vector,
    row_count: usize,
) -> Result<()> {
    let const_fold = Batch::empty_for_const_fold();
    vec.reset_nulls(row_count)?;
    for (cell, exec) in cells.iter().zip(execs.iter_mut()) {
        let value = exec.eval(proc, &[&const_fold], None)?;
        vec.copy(&value, cell.row_pos, 0)?;
    }
    Ok(())
}

/// Appends cells in list order to an emptied vector.
fn eval_rowset_append(
    proc: &Process,
    execs: &mut [ExpressionExecutor],
    vec: &mut Vector,
) -> Result<()> {
    let const_fold = Batch::empty_for_const_fold();
    vec.reset_storage();
    for exec in execs.iter_mut() {
        let value = exec.eval(proc, &[&const_fold], None)?;
        vec.append_from(&value, 0)?;
    }
    Ok(())
}

impl Operator for ValueScan {
    fn op_type(&self) -> OpType {
        OpType::ValueScan
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn prepare(&mut self, proc: &Process) -> Result<()> {
        self.state = ValueScanState::Uninitialized;
        self.base.prepare_analyzer(OP_NAME);
        self.base.prepare_projection(proc)?;
        if !self.prebuilt {
            self.make_value_scan_batch(proc)?;
        }
        self.cursor = 0;
        self.state = ValueScanState::Prepared;
        Ok(())
    }

    fn call(&mut self, proc: &Process) -> Result<CallResult> {
        if let Some(reason) = proc.check_cancel() {
            trace!(query_id = %proc.query_id(), idx = self.base.idx, ?reason, "value scan canceled");
            return Ok(CallResult::Canceled(reason));
        }
        if self.state == ValueScanState::Uninitialized {
            return Err(Error::OperatorState("value scan called before prepare".into()));
        }

        self.base.analyzer_start();
        let result = self.serve(proc);
        self.base.analyzer_stop();
        result
    }

    fn reset(&mut self, _proc: &Process) {
        self.cursor = 0;
        self.state = ValueScanState::Uninitialized;
    }

    fn free(&mut self, _proc: &Process) {
        for batch in &mut self.batches {
            if let Some(batch) = Arc::get_mut(batch) {
                batch.free();
            }
        }
        self.batches.clear();
        self.expr_exec_lists = None;
        self.base.free();
        self.cursor = 0;
        self.state = ValueScanState::Uninitialized;
    }
}

impl fmt::Display for ValueScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OP_NAME}: ")?;
        match (&self.rowset, self.prebuilt) {
            (_, true) => write!(f, "{} batches", self.batches.len())?,
            (Some(rowset), false) if rowset.col_count() > 0 => {
                write!(f, "{} rows x {} cols", rowset.row_count, rowset.col_count())?;
            }
            _ => f.write_str("literal")?,
        }
        if let Some(projection) = self.base.projection() {
            write!(f, " project [{projection}]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValueScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueScan")
            .field("base", &self.base)
            .field("rowset", &self.rowset)
            .field("fill_mode", &self.fill_mode)
            .field("batches", &self.batches.len())
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .finish()
    }
}
