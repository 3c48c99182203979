//! Vectorized expression evaluator.

use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float32Array,
    Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::compute::kernels::boolean::{and_kleene, not, or_kleene};
use arrow::compute::kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq};
use arrow::compute::kernels::numeric::{add, div, mul, rem, sub};
use arrow::compute::{cast, is_not_null, is_null};
use arrow::datatypes::DataType as ArrowDataType;
use arrow::error::{ArrowError, Result as ArrowResult};

use crate::executor::expr::{ArithmeticOp, ComparisonOp, Expr, LogicalOp};
use crate::types::Value;

/// Columns and parameters an expression is evaluated against.
///
/// `columns` is indexed by column position; only referenced positions need
/// to be populated.
#[derive(Debug, Clone, Copy)]
pub struct EvalInput<'a> {
    pub columns: &'a [Option<ArrayRef>],
    pub num_rows: usize,
    pub params: &'a [Value],
}

impl<'a> EvalInput<'a> {
    /// Input with no columns, used for constant folding.
    #[must_use]
    pub fn constant(num_rows: usize, params: &'a [Value]) -> Self {
        EvalInput {
            columns: &[],
            num_rows,
            params,
        }
    }
}

/// Vectorized expression evaluator.
///
/// Evaluates expressions over Arrow arrays in a batch-oriented fashion.
pub struct VectorizedEvaluator;

impl VectorizedEvaluator {
    /// Evaluates an expression against the given input.
    ///
    /// Returns an Arrow array with `input.num_rows` rows.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the expression references a missing column or
    /// parameter, or if an arithmetic/comparison operation fails.
    pub fn evaluate(expr: &Expr, input: &EvalInput<'_>) -> ArrowResult<ArrayRef> {
        match expr {
            Expr::Literal(value) => Self::create_literal_array(value, input.num_rows),
            Expr::Column(index) => input
                .columns
                .get(*index)
                .and_then(Option::as_ref)
                .cloned()
                .ok_or_else(|| {
                    ArrowError::InvalidArgumentError(format!("Column not found: #{index}"))
                }),
            Expr::Param(index) => {
                let value = input.params.get(*index).ok_or_else(|| {
                    ArrowError::InvalidArgumentError(format!("Unbound parameter: ${}", index + 1))
                })?;
                Self::create_literal_array(value, input.num_rows)
            }
            Expr::Comparison { left, op, right } => {
                let left_arr = Self::evaluate(left, input)?;
                let right_arr = Self::evaluate(right, input)?;
                Self::compare(&left_arr, *op, &right_arr)
            }
            Expr::Logical { op, operands } => Self::evaluate_logical(*op, operands, input),
            Expr::Arithmetic { left, op, right } => {
                let left_arr = Self::evaluate(left, input)?;
                let right_arr = Self::evaluate(right, input)?;
                Self::arithmetic(&left_arr, *op, &right_arr)
            }
            Expr::IsNull { operand, negated } => {
                let arr = Self::evaluate(operand, input)?;
                if arr.data_type() == &ArrowDataType::Null {
                    return Ok(Arc::new(BooleanArray::from(vec![!*negated; arr.len()])));
                }
                let nulls = if *negated {
                    is_not_null(&arr)?
                } else {
                    is_null(&arr)?
                };
                Ok(Arc::new(nulls))
            }
            Expr::Cast { operand, to } => {
                let arr = Self::evaluate(operand, input)?;
                cast(&arr, &to.to_arrow())
            }
        }
    }

    /// Creates a literal array with the same value repeated.
    fn create_literal_array(value: &Value, len: usize) -> ArrowResult<ArrayRef> {
        match value {
            Value::Int64(v) => Ok(Arc::new(Int64Array::from(vec![*v; len]))),
            Value::Float32(v) => Ok(Arc::new(Float32Array::from(vec![*v; len]))),
            Value::Float64(v) => Ok(Arc::new(Float64Array::from(vec![*v; len]))),
            Value::Bool(v) => Ok(Arc::new(BooleanArray::from(vec![*v; len]))),
            Value::String(v) => Ok(Arc::new(StringArray::from(vec![v.as_str(); len]))),
            Value::Date(v) => Ok(Arc::new(Date32Array::from(vec![*v; len]))),
            Value::Timestamp(v) => Ok(Arc::new(TimestampMicrosecondArray::from(vec![*v; len]))),
            // Untyped null; coerced to the other operand's type where needed.
            Value::Null => Ok(new_null_array(&ArrowDataType::Null, len)),
        }
    }

    /// Casts an untyped null operand to the type of the other side.
    fn coerce_nulls(left: &ArrayRef, right: &ArrayRef) -> ArrowResult<(ArrayRef, ArrayRef)> {
        match (left.data_type(), right.data_type()) {
            (ArrowDataType::Null, ArrowDataType::Null) => Ok((
                new_null_array(&ArrowDataType::Int64, left.len()),
                new_null_array(&ArrowDataType::Int64, right.len()),
            )),
            (ArrowDataType::Null, other) => Ok((cast(left, other)?, Arc::clone(right))),
            (other, ArrowDataType::Null) => Ok((Arc::clone(left), cast(right, other)?)),
            _ => Ok((Arc::clone(left), Arc::clone(right))),
        }
    }

    /// Compares two arrays using the given operator.
    fn compare(left: &ArrayRef, op: ComparisonOp, right: &ArrayRef) -> ArrowResult<ArrayRef> {
        let (left, right) = Self::coerce_nulls(left, right)?;
        if left.data_type() != right.data_type() {
            return Err(ArrowError::ComputeError(format!(
                "Unsupported comparison between {:?} and {:?}",
                left.data_type(),
                right.data_type()
            )));
        }
        let result = match op {
            ComparisonOp::Eq => eq(&left, &right)?,
            ComparisonOp::Neq => neq(&left, &right)?,
            ComparisonOp::Lt => lt(&left, &right)?,
            ComparisonOp::Lte => lt_eq(&left, &right)?,
            ComparisonOp::Gt => gt(&left, &right)?,
            ComparisonOp::Gte => gt_eq(&left, &right)?,
        };
        Ok(Arc::new(result))
    }

    /// Evaluates a logical operation.
    fn evaluate_logical(
        op: LogicalOp,
        operands: &[Expr],
        input: &EvalInput<'_>,
    ) -> ArrowResult<ArrayRef> {
        let booleans = operands
            .iter()
            .map(|operand| {
                let arr = Self::evaluate(operand, input)?;
                let arr = if arr.data_type() == &ArrowDataType::Null {
                    cast(&arr, &ArrowDataType::Boolean)?
                } else {
                    arr
                };
                arr.as_boolean_opt().cloned().ok_or_else(|| {
                    ArrowError::ComputeError(format!("{op:?} operand must be boolean"))
                })
            })
            .collect::<ArrowResult<Vec<BooleanArray>>>()?;

        match op {
            LogicalOp::And => {
                let mut result: Option<BooleanArray> = None;
                for arr in &booleans {
                    result = Some(match result {
                        Some(prev) => and_kleene(&prev, arr)?,
                        None => arr.clone(),
                    });
                }
                Ok(Arc::new(result.unwrap_or_else(|| {
                    BooleanArray::from(vec![true; input.num_rows])
                })))
            }
            LogicalOp::Or => {
                let mut result: Option<BooleanArray> = None;
                for arr in &booleans {
                    result = Some(match result {
                        Some(prev) => or_kleene(&prev, arr)?,
                        None => arr.clone(),
                    });
                }
                Ok(Arc::new(result.unwrap_or_else(|| {
                    BooleanArray::from(vec![false; input.num_rows])
                })))
            }
            LogicalOp::Not => match booleans.first() {
                Some(first) => Ok(Arc::new(not(first)?)),
                None => Err(ArrowError::ComputeError("NOT requires an operand".to_string())),
            },
        }
    }

    /// Performs arithmetic on two arrays. Integer overflow and division by
    /// zero are errors.
    fn arithmetic(left: &ArrayRef, op: ArithmeticOp, right: &ArrayRef) -> ArrowResult<ArrayRef> {
        let (left, right) = Self::coerce_nulls(left, right)?;
        match (left.data_type(), right.data_type()) {
            (ArrowDataType::Int64, ArrowDataType::Int64)
            | (ArrowDataType::Float64, ArrowDataType::Float64)
            | (ArrowDataType::Float32, ArrowDataType::Float32) => match op {
                ArithmeticOp::Add => add(&left, &right),
                ArithmeticOp::Sub => sub(&left, &right),
                ArithmeticOp::Mul => mul(&left, &right),
                ArithmeticOp::Div => div(&left, &right),
                ArithmeticOp::Mod => rem(&left, &right),
            },
            _ => Err(ArrowError::ComputeError(format!(
                "Unsupported arithmetic between {:?} and {:?}",
                left.data_type(),
                right.data_type()
            ))),
        }
    }
}
