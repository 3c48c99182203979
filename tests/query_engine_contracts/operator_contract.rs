//! Contract tests for the operator call protocol.
//!
//! These tests verify:
//! - Cancellation is observed before any state change
//! - End of data is idempotent
//! - Analyzer brackets every non-canceled call
//! - Re-execution re-materializes the value scan in place

use colexec::executor::analyzer::{Analyzer, OperatorStats};
use colexec::executor::rowset::RowsetColumn;
use colexec::{
    Batch, CallResult, CancelReason, DataType, Error, ExecutorConfig, Expr, FillMode, Operator,
    OperatorBase, Process, RowsetDescriptor, ValueScan, ValueScanState, Value,
};
use std::sync::Arc;

use datafusion::execution::memory_pool::MemoryPool;
use parking_lot::Mutex;

/// Analyzer recording the hook sequence into a shared log.
#[derive(Clone, Default)]
struct RecordingAnalyzer {
    events: Arc<Mutex<Vec<String>>>,
}

impl Analyzer for RecordingAnalyzer {
    fn start(&mut self) {
        self.events.lock().push("start".into());
    }

    fn stop(&mut self) {
        self.events.lock().push("stop".into());
    }

    fn input(&mut self, batch: Option<&Batch>) {
        self.events
            .lock()
            .push(format!("input:{}", batch.map_or(-1, |b| b.row_count() as i64)));
    }

    fn output(&mut self, batch: Option<&Batch>) {
        self.events
            .lock()
            .push(format!("output:{}", batch.map_or(-1, |b| b.row_count() as i64)));
    }

    fn reset(&mut self) {
        self.events.lock().push("reset".into());
    }

    fn stats(&self) -> OperatorStats {
        OperatorStats::default()
    }
}

fn two_by_two() -> RowsetDescriptor {
    RowsetDescriptor::from_rows(
        &[DataType::Int64, DataType::String],
        vec![
            vec![Expr::lit(1i64), Expr::lit("a")],
            vec![Expr::lit(2i64), Expr::lit("b")],
        ],
    )
    .unwrap()
}

#[test]
fn test_analyzer_hook_order() {
    let proc = Process::default();
    let analyzer = RecordingAnalyzer::default();
    let base = OperatorBase::new(0, true, true).with_analyzer(Box::new(analyzer.clone()));
    let mut scan = ValueScan::from_rowset(two_by_two()).with_base(base);

    scan.prepare(&proc).unwrap();
    scan.call(&proc).unwrap();
    scan.call(&proc).unwrap();

    let events = analyzer.events.lock().clone();
    assert_eq!(
        events,
        vec![
            "reset", "start", "input:2", "output:2", "stop", "start", "input:-1", "output:-1",
            "stop"
        ]
    );
}

#[test]
fn test_cancel_touches_nothing() {
    let proc = Process::default();
    let analyzer = RecordingAnalyzer::default();
    let base = OperatorBase::default().with_analyzer(Box::new(analyzer.clone()));
    let mut scan = ValueScan::from_rowset(two_by_two()).with_base(base);
    scan.prepare(&proc).unwrap();
    analyzer.events.lock().clear();

    let handle = proc.cancel_handle();
    handle.cancel();
    for _ in 0..2 {
        match scan.call(&proc).unwrap() {
            CallResult::Canceled(reason) => assert_eq!(reason, CancelReason::Canceled),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
    assert!(analyzer.events.lock().is_empty());
    assert_eq!(scan.state(), ValueScanState::Prepared);
}

#[test]
fn test_end_is_idempotent_for_every_source() {
    let proc = Process::default();
    let mut scans = vec![
        ValueScan::literal(),
        ValueScan::from_rowset(two_by_two()),
        ValueScan::from_batches(Vec::new()),
    ];
    for scan in &mut scans {
        scan.prepare(&proc).unwrap();
        while scan.call(&proc).unwrap().batch().is_some() {}
        for _ in 0..3 {
            assert!(scan.call(&proc).unwrap().is_end());
        }
        assert_eq!(scan.state(), ValueScanState::Exhausted);
    }
}

#[test]
fn test_degenerate_batch_shape() {
    let proc = Process::default();
    let mut scan = ValueScan::literal();
    scan.prepare(&proc).unwrap();
    let result = scan.call(&proc).unwrap();
    let batch = result.batch().unwrap();

    assert_eq!((batch.row_count(), batch.num_columns()), (1, 1));
    let vec = batch.vector(0).unwrap();
    assert_eq!(vec.data_type(), DataType::Int64);
    assert_eq!(vec.get_value(0).unwrap(), Value::Null);
}

#[test]
fn test_fill_mode_defaults_from_config() {
    let proc = Process::new(ExecutorConfig::new().with_fill_mode(FillMode::Append));
    let scan = ValueScan::from_rowset(two_by_two());
    assert_eq!(scan.fill_mode(&proc), FillMode::Append);

    let scan = scan.with_fill_mode(FillMode::Positional);
    assert_eq!(scan.fill_mode(&proc), FillMode::Positional);
}

#[test]
fn test_append_mode_ignores_positions() {
    let proc = Process::default();
    let desc = RowsetDescriptor::new(2).with_column(
        RowsetColumn::new(DataType::Int64)
            .with_cell(Expr::lit(5i64), 1)
            .with_cell(Expr::lit(6i64), 1),
    );
    let mut scan = ValueScan::from_rowset(desc).with_fill_mode(FillMode::Append);
    scan.prepare(&proc).unwrap();
    let result = scan.call(&proc).unwrap();
    let vec = result.batch().unwrap().vector(0).unwrap();
    assert_eq!(vec.get_value(0).unwrap(), Value::Int64(5));
    assert_eq!(vec.get_value(1).unwrap(), Value::Int64(6));
}

#[test]
fn test_positional_rematerialization_with_params() {
    let proc = Process::default().with_params(vec![Value::from("x"), Value::from("y")]);
    let desc = RowsetDescriptor::new(2).with_column(
        RowsetColumn::new(DataType::String)
            .with_cell(Expr::param(1), 1)
            .with_cell(Expr::param(0), 0),
    );
    let mut scan = ValueScan::from_rowset(desc);

    scan.prepare(&proc).unwrap();
    drop(scan.call(&proc).unwrap());
    scan.reset(&proc);
    proc.bind_params(vec![Value::Null, Value::from("z")]);
    scan.prepare(&proc).unwrap();

    let result = scan.call(&proc).unwrap();
    let vec = result.batch().unwrap().vector(0).unwrap();
    assert_eq!(vec.len(), 2);
    assert_eq!(vec.get_value(0).unwrap(), Value::Null);
    assert_eq!(vec.get_value(1).unwrap(), Value::from("z"));
    assert_eq!(scan.expr_exec_builds(), 1);
}

#[test]
fn test_cell_type_mismatch_fails_prepare() {
    let proc = Process::default();
    let desc = RowsetDescriptor::new(1)
        .with_column(RowsetColumn::new(DataType::Int64).with_cell(Expr::lit("nope"), 0));
    let mut scan = ValueScan::from_rowset(desc);
    assert!(matches!(scan.prepare(&proc), Err(Error::TypeError { .. })));
}

#[test]
fn test_boxed_operator_dispatch() {
    let proc = Process::default();
    let mut op: colexec::BoxedOperator = Box::new(ValueScan::literal());
    assert_eq!(op.op_type().name(), "value_scan");
    op.prepare(&proc).unwrap();
    assert!(op.call(&proc).unwrap().batch().is_some());
    op.free(&proc);
    assert_eq!(proc.mp().reserved(), 0);
}
