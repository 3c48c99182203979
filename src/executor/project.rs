//! Output projection applied to the batches an operator produces.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::expr::Expr;
use super::expr_executor::ExpressionExecutor;
use super::process::Process;
use super::vectorized::Batch;

/// An ordered list of output expressions evaluated against each produced
/// batch.
pub struct Projection {
    exprs: Vec<Expr>,
    names: Vec<String>,
    executors: Option<Vec<ExpressionExecutor>>,
}

impl Projection {
    /// Creates a projection with the given expressions.
    #[must_use]
    pub fn new(exprs: Vec<Expr>) -> Self {
        Projection {
            exprs,
            names: Vec::new(),
            executors: None,
        }
    }

    /// Sets the output column names.
    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    /// Returns the output expressions.
    #[must_use]
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Compiles the executors. Already compiled executors are kept.
    pub fn prepare(&mut self, proc: &Process) -> Result<()> {
        if self.executors.is_none() {
            let executors = self
                .exprs
                .iter()
                .map(|e| ExpressionExecutor::new(proc, e))
                .collect::<Result<Vec<_>>>()?;
            self.executors = Some(executors);
        }
        Ok(())
    }

    /// Evaluates every expression against `batch` into a new batch with the
    /// same row count.
    pub fn eval(&mut self, batch: &Batch, proc: &Process) -> Result<Arc<Batch>> {
        let executors = self
            .executors
            .as_mut()
            .ok_or_else(|| Error::OperatorState("projection evaluated before prepare".into()))?;
        let rows = batch.row_count();
        let mut vecs = Vec::with_capacity(executors.len());
        for exec in executors.iter_mut() {
            let mut vec = exec.eval(proc, &[batch], None)?;
            if vec.is_const() {
                vec.set_const_len(rows)?;
            }
            vecs.push(vec);
        }
        Ok(Arc::new(Batch::new(vecs, rows).with_attrs(self.names.clone())))
    }

    /// Drops the compiled executors.
    pub fn free(&mut self) {
        self.executors = None;
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("exprs", &self.exprs)
            .field("names", &self.names)
            .field("prepared", &self.executors.is_some())
            .finish()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.exprs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
