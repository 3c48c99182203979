//! Filter operator: keeps the rows of each child batch whose predicate is true.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{DataType, Value};

use super::expr::Expr;
use super::expr_executor::ExpressionExecutor;
use super::operator::{BoxedOperator, CallResult, OpType, Operator, OperatorBase};
use super::process::Process;
use super::vectorized::{Batch, SelectionVector};

const OP_NAME: &str = "filter";

/// Vectorized predicate evaluation over a child operator.
///
/// Rows where the predicate is false or null are dropped. A batch with no
/// surviving rows is still emitted, as an empty batch.
pub struct Filter {
    base: OperatorBase,
    child: BoxedOperator,
    predicate: Expr,
    executor: Option<ExpressionExecutor>,
}

impl Filter {
    /// Creates a filter over `child`.
    #[must_use]
    pub fn new(child: BoxedOperator, predicate: Expr) -> Self {
        Filter {
            base: OperatorBase::new(1, false, true),
            child,
            predicate,
            executor: None,
        }
    }

    /// Sets the pipeline position, projection and analyzer.
    #[must_use]
    pub fn with_base(mut self, base: OperatorBase) -> Self {
        self.base = base;
        self
    }

    /// Returns the predicate.
    #[must_use]
    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }

    /// Returns the child operator.
    #[must_use]
    pub fn child(&self) -> &dyn Operator {
        self.child.as_ref()
    }

    fn select(&mut self, batch: &Batch, proc: &Process) -> Result<SelectionVector> {
        let executor = self
            .executor
            .as_mut()
            .ok_or_else(|| Error::OperatorState("filter called before prepare".into()))?;
        let mask = executor.eval(proc, &[batch], None)?;
        if mask.data_type() != DataType::Bool {
            return Err(Error::TypeError {
                expected: DataType::Bool.name().into(),
                actual: mask.data_type().name().into(),
            });
        }
        let mut indices = Vec::with_capacity(batch.row_count());
        for row in 0..batch.row_count() {
            if mask.get_value(row)? == Value::Bool(true) {
                indices.push(row as u32);
            }
        }
        Ok(SelectionVector::new(indices))
    }
}

impl Operator for Filter {
    fn op_type(&self) -> OpType {
        OpType::Filter
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn prepare(&mut self, proc: &Process) -> Result<()> {
        self.base.prepare_analyzer(OP_NAME);
        self.base.prepare_projection(proc)?;
        self.child.prepare(proc)?;
        if self.executor.is_none() {
            self.executor = Some(ExpressionExecutor::new(proc, &self.predicate)?);
        }
        Ok(())
    }

    fn call(&mut self, proc: &Process) -> Result<CallResult> {
        if let Some(reason) = proc.check_cancel() {
            trace!(query_id = %proc.query_id(), idx = self.base.idx, ?reason, "filter canceled");
            return Ok(CallResult::Canceled(reason));
        }

        self.base.analyzer_start();
        let result = match self.child.call(proc) {
            Ok(CallResult::Batch(input)) => self.filter_batch(input, proc),
            other => other,
        };
        self.base.analyzer_stop();
        result
    }

    fn reset(&mut self, proc: &Process) {
        self.child.reset(proc);
    }

    fn free(&mut self, proc: &Process) {
        self.child.free(proc);
        self.executor = None;
        self.base.free();
    }
}

impl Filter {
    fn filter_batch(&mut self, input: Arc<Batch>, proc: &Process) -> Result<CallResult> {
        let selection = self.select(&input, proc)?;
        let selected = if selection.len() == input.row_count() {
            Arc::clone(&input)
        } else {
            Arc::new(input.take(&selection, proc.mp())?)
        };
        let output = self.base.eval_projection(Some(selected), proc)?;
        self.base.analyzer_record(Some(&input), output.as_deref());
        Ok(match output {
            Some(batch) => CallResult::Batch(batch),
            None => CallResult::End,
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OP_NAME}: {}", self.predicate)?;
        if let Some(projection) = self.base.projection() {
            write!(f, " project [{projection}]")?;
        }
        write!(f, " <- {}", self.child)
    }
}
