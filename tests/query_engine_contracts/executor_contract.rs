//! Contract tests for expression executors.
//!
//! These tests verify the evaluation contracts:
//! - Constant trees fold once and evaluate against the const-fold input
//! - Parameters are read from the process at evaluation time
//! - Column trees respect selection vectors
//! - Evaluation errors propagate unchanged

use colexec::executor::expr::{ArithmeticOp, ComparisonOp, LogicalOp};
use colexec::executor::vectorized::SelectionVector;
use colexec::{Batch, DataType, Error, Expr, ExpressionExecutor, Process, Value, Vector};

fn int_batch(proc: &Process, values: &[Option<i64>]) -> Batch {
    let mut vec = Vector::new(DataType::Int64, proc.mp());
    for v in values {
        vec.push_value(&v.map_or(Value::Null, Value::Int64)).unwrap();
    }
    Batch::new(vec![vec], values.len())
}

#[test]
fn test_literal_against_const_fold_input() {
    // Contract: a literal evaluated against the const-fold input yields one row
    let proc = Process::default();
    let mut exec = ExpressionExecutor::new(&proc, &Expr::lit(3.5f64)).unwrap();
    let input = Batch::empty_for_const_fold();

    let vec = exec.eval(&proc, &[&input], None).unwrap();
    assert_eq!(vec.len(), 1);
    assert_eq!(vec.data_type(), DataType::Float64);
    assert_eq!(vec.get_value(0).unwrap(), Value::Float64(3.5));
}

#[test]
fn test_cast_literal() {
    // Contract: casts are folded with the operand's value
    let proc = Process::default();
    let expr = Expr::lit(7i64).cast(DataType::String);
    let mut exec = ExpressionExecutor::new(&proc, &expr).unwrap();
    let vec = exec.eval(&proc, &[], None).unwrap();
    assert_eq!(vec.get_value(0).unwrap(), Value::from("7"));
}

#[test]
fn test_rebinding_params_changes_result() {
    // Contract: the same executor re-reads parameters on every evaluation
    let proc = Process::default().with_params(vec![Value::from("a")]);
    let mut exec = ExpressionExecutor::new(&proc, &Expr::param(0)).unwrap();
    assert_eq!(exec.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::from("a"));

    proc.bind_params(vec![Value::from("b")]);
    assert_eq!(exec.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::from("b"));
}

#[test]
fn test_unbound_param_is_error() {
    let proc = Process::default();
    let mut exec = ExpressionExecutor::new(&proc, &Expr::param(2)).unwrap();
    assert!(exec.eval(&proc, &[], None).is_err());
}

#[test]
fn test_null_propagates_through_arithmetic() {
    // Contract: arithmetic over a null row yields null, other rows are computed
    let proc = Process::default();
    let batch = int_batch(&proc, &[Some(1), None, Some(3)]);
    let expr = Expr::arith(Expr::col(0), ArithmeticOp::Mul, Expr::lit(2i64));
    let mut exec = ExpressionExecutor::new(&proc, &expr).unwrap();

    let vec = exec.eval(&proc, &[&batch], None).unwrap();
    assert_eq!(vec.get_value(0).unwrap(), Value::Int64(2));
    assert_eq!(vec.get_value(1).unwrap(), Value::Null);
    assert_eq!(vec.get_value(2).unwrap(), Value::Int64(6));
}

#[test]
fn test_kleene_logic() {
    // Contract: NULL AND false = false, NULL OR true = true
    let proc = Process::default();
    let and = Expr::Logical {
        op: LogicalOp::And,
        operands: vec![Expr::null(DataType::Bool), Expr::lit(false)],
    };
    let or = Expr::Logical {
        op: LogicalOp::Or,
        operands: vec![Expr::null(DataType::Bool), Expr::lit(true)],
    };
    let mut and = ExpressionExecutor::new(&proc, &and).unwrap();
    let mut or = ExpressionExecutor::new(&proc, &or).unwrap();
    assert_eq!(and.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::Bool(false));
    assert_eq!(or.eval(&proc, &[], None).unwrap().get_value(0).unwrap(), Value::Bool(true));
}

#[test]
fn test_selection_restricts_rows() {
    let proc = Process::default();
    let batch = int_batch(&proc, &[Some(10), Some(20), Some(30)]);
    let expr = Expr::compare(Expr::col(0), ComparisonOp::Neq, Expr::lit(20i64));
    let mut exec = ExpressionExecutor::new(&proc, &expr).unwrap();

    let selection = SelectionVector::new(vec![1, 2]);
    let vec = exec.eval(&proc, &[&batch], Some(&selection)).unwrap();
    assert_eq!(vec.len(), 2);
    assert_eq!(vec.get_value(0).unwrap(), Value::Bool(false));
    assert_eq!(vec.get_value(1).unwrap(), Value::Bool(true));
}

#[test]
fn test_division_by_zero_propagates() {
    // Contract: evaluation errors surface unchanged
    let proc = Process::default();
    let batch = int_batch(&proc, &[Some(1)]);
    let expr = Expr::arith(Expr::col(0), ArithmeticOp::Div, Expr::lit(0i64));
    let mut exec = ExpressionExecutor::new(&proc, &expr).unwrap();
    assert!(matches!(exec.eval(&proc, &[&batch], None), Err(Error::DivisionByZero)));
}
