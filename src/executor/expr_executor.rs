//! Prepared, reusable evaluators for expression trees.

use arrow::array::ArrayRef;

use crate::error::{Error, Result};
use crate::types::DataType;

use super::expr::Expr;
use super::process::Process;
use super::vectorized::vector::scalar_at;
use super::vectorized::{Batch, EvalInput, SelectionVector, Vector, VectorizedEvaluator};

/// Compiled form of an expression.
#[derive(Debug)]
enum Compiled {
    /// Folded once at construction; one row, typed.
    Constant(ArrayRef),
    /// Evaluated on every call. Column positions are pre-collected.
    Tree { column_refs: Vec<usize> },
}

/// Evaluator for one expression tree.
///
/// Construction walks the tree and folds it when it depends on neither
/// columns nor parameters. Re-evaluation against any input is legal, so one
/// executor serves every execution of a prepared statement.
#[derive(Debug)]
pub struct ExpressionExecutor {
    expr: Expr,
    compiled: Compiled,
}

impl ExpressionExecutor {
    /// Compiles an expression.
    ///
    /// # Errors
    ///
    /// Returns an error if a constant expression fails to fold (e.g. division
    /// by zero in literals).
    pub fn new(proc: &Process, expr: &Expr) -> Result<Self> {
        let compiled = if expr.is_constant() {
            let params = proc.params();
            let folded = VectorizedEvaluator::evaluate(expr, &EvalInput::constant(1, &params))?;
            Compiled::Constant(folded)
        } else {
            Compiled::Tree {
                column_refs: expr.column_refs(),
            }
        };
        Ok(ExpressionExecutor {
            expr: expr.clone(),
            compiled,
        })
    }

    /// Returns the source expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Returns true if the expression was folded at construction.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self.compiled, Compiled::Constant(_))
    }

    /// Evaluates the expression.
    ///
    /// Only the first batch of `batches` is read; an empty slice is treated
    /// as the constant-folding input. Expressions that reference no columns
    /// yield a constant vector broadcast to the input's row count (one row
    /// for an input without columns).
    ///
    /// # Errors
    ///
    /// Returns evaluation errors unchanged, and allocation errors from the
    /// process memory pool.
    pub fn eval(
        &mut self,
        proc: &Process,
        batches: &[&Batch],
        selection: Option<&SelectionVector>,
    ) -> Result<Vector> {
        let const_fold = Batch::empty_for_const_fold();
        let input = batches.first().copied().unwrap_or(&const_fold);
        let rows = match selection {
            Some(sel) => sel.len(),
            None if input.num_columns() == 0 => input.row_count().max(1),
            None => input.row_count(),
        };

        match &self.compiled {
            Compiled::Constant(folded) => broadcast(folded, rows, proc),
            Compiled::Tree { column_refs } if column_refs.is_empty() => {
                let params = proc.params();
                let array =
                    VectorizedEvaluator::evaluate(&self.expr, &EvalInput::constant(1, &params))?;
                broadcast(&array, rows, proc)
            }
            Compiled::Tree { column_refs } => {
                let width = column_refs.last().map_or(0, |max| max + 1);
                let mut columns: Vec<Option<ArrayRef>> = vec![None; width];
                for &index in column_refs {
                    let vec = input.vector(index).ok_or_else(|| {
                        Error::InvalidExpression(format!(
                            "{} references column #{index}, input has {} columns",
                            self.expr,
                            input.num_columns()
                        ))
                    })?;
                    let mut array = column_array(vec, input.row_count())?;
                    if let Some(sel) = selection {
                        let indices = arrow::array::UInt32Array::from(sel.indices.clone());
                        array = arrow::compute::take(&array, &indices, None)?;
                    }
                    columns[index] = Some(array);
                }
                let params = proc.params();
                let input = EvalInput {
                    columns: &columns,
                    num_rows: rows,
                    params: &params,
                };
                let array = VectorizedEvaluator::evaluate(&self.expr, &input)?;
                Vector::from_array(array.as_ref(), proc.mp())
            }
        }
    }
}

/// Wraps a one-row result as a constant vector of `rows` rows.
fn broadcast(array: &ArrayRef, rows: usize, proc: &Process) -> Result<Vector> {
    let data_type = DataType::from_arrow(array.data_type()).ok_or_else(|| {
        Error::UnsupportedOperation(format!("unsupported result type {}", array.data_type()))
    })?;
    Vector::new_const(&scalar_at(array.as_ref(), 0)?, data_type, rows, proc.mp())
}

/// Expands a vector to exactly `rows` Arrow rows.
fn column_array(vec: &Vector, rows: usize) -> Result<ArrayRef> {
    let array = vec.to_array()?;
    if array.len() == rows {
        return Ok(array);
    }
    if vec.is_const() && !array.is_empty() {
        let indices = arrow::array::UInt32Array::from(vec![0u32; rows]);
        return Ok(arrow::compute::take(&array, &indices, None)?);
    }
    Err(Error::InvalidVector(format!(
        "column has {} rows, batch has {rows}",
        array.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::expr::{ArithmeticOp, ComparisonOp};
    use crate::types::Value;

    #[test]
    fn test_constant_folds_once() {
        let proc = Process::default();
        let e = Expr::arith(Expr::lit(2i64), ArithmeticOp::Add, Expr::lit(3i64));
        let mut exec = ExpressionExecutor::new(&proc, &e).unwrap();
        assert!(exec.is_constant());

        let v = exec.eval(&proc, &[], None).unwrap();
        assert!(v.is_const());
        assert_eq!(v.len(), 1);
        assert_eq!(v.get_value(0).unwrap(), Value::Int64(5));
    }

    #[test]
    fn test_const_fold_input_yields_one_row() {
        let proc = Process::default();
        let mut exec = ExpressionExecutor::new(&proc, &Expr::lit("x")).unwrap();
        let input = Batch::empty_for_const_fold();
        let v = exec.eval(&proc, &[&input], None).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.get_value(0).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_param_is_read_at_eval_time() {
        let proc = Process::default().with_params(vec![Value::Int64(1)]);
        let mut exec = ExpressionExecutor::new(&proc, &Expr::param(0)).unwrap();
        assert!(!exec.is_constant());
        assert_eq!(exec.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::Int64(1));

        proc.bind_params(vec![Value::Int64(9)]);
        assert_eq!(exec.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::Int64(9));
    }

    #[test]
    fn test_typed_null_constant() {
        let proc = Process::default();
        let mut exec = ExpressionExecutor::new(&proc, &Expr::null(DataType::String)).unwrap();
        let v = exec.eval(&proc, &[], None).unwrap();
        assert!(v.is_const_null());
        assert_eq!(v.data_type(), DataType::String);
    }

    #[test]
    fn test_column_expression_with_selection() {
        let proc = Process::default();
        let mut col = Vector::new(DataType::Int64, proc.mp());
        for i in [1i64, 2, 3, 4] {
            col.push_value(&Value::Int64(i)).unwrap();
        }
        let batch = Batch::new(vec![col], 4);
        let e = Expr::compare(Expr::col(0), ComparisonOp::Gte, Expr::lit(3i64));
        let mut exec = ExpressionExecutor::new(&proc, &e).unwrap();

        let all = exec.eval(&proc, &[&batch], None).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.get_value(2).unwrap(), Value::Bool(true));

        let sel = SelectionVector::new(vec![0, 3]);
        let some = exec.eval(&proc, &[&batch], Some(&sel)).unwrap();
        assert_eq!(some.len(), 2);
        assert_eq!(some.get_value(0).unwrap(), Value::Bool(false));
        assert_eq!(some.get_value(1).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_missing_column_is_error() {
        let proc = Process::default();
        let mut exec = ExpressionExecutor::new(&proc, &Expr::col(1)).unwrap();
        let err = exec.eval(&proc, &[], None).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)));
    }

    #[test]
    fn test_fold_error_surfaces_at_construction() {
        let proc = Process::default();
        let e = Expr::arith(Expr::lit(1i64), ArithmeticOp::Div, Expr::lit(0i64));
        assert!(matches!(
            ExpressionExecutor::new(&proc, &e),
            Err(Error::DivisionByZero)
        ));
    }
}
