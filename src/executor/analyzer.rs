//! Per-operator instrumentation: call timing and batch shapes.

use std::time::{Duration, Instant};

use tracing::debug;

use super::vectorized::Batch;

/// Counters accumulated by an analyzer over one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorStats {
    /// Number of completed start/stop brackets.
    pub call_num: u64,
    /// Wall time spent inside calls.
    pub time_consumed: Duration,
    /// Batches observed on the input side.
    pub input_batches: u64,
    pub input_rows: u64,
    pub input_size: u64,
    /// Batches observed on the output side.
    pub output_batches: u64,
    pub output_rows: u64,
    pub output_size: u64,
}

/// Instrumentation hooks invoked by operators around each call.
///
/// `input`/`output` receive `None` when a call produced no batch.
pub trait Analyzer: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn input(&mut self, batch: Option<&Batch>);
    fn output(&mut self, batch: Option<&Batch>);
    /// Clears the counters for a re-execution.
    fn reset(&mut self);
    fn stats(&self) -> OperatorStats;
}

/// Default analyzer keeping counters in memory.
///
/// The counters of a finished execution are logged at `debug` when the
/// analyzer is reset for the next one.
#[derive(Debug)]
pub struct OperatorAnalyzer {
    name: String,
    node_idx: usize,
    started: Option<Instant>,
    stats: OperatorStats,
}

impl OperatorAnalyzer {
    /// Creates an analyzer for the operator at `node_idx` in its pipeline.
    pub fn new(node_idx: usize, name: impl Into<String>) -> Self {
        OperatorAnalyzer {
            name: name.into(),
            node_idx,
            started: None,
            stats: OperatorStats::default(),
        }
    }
}

impl Analyzer for OperatorAnalyzer {
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.stats.time_consumed += started.elapsed();
            self.stats.call_num += 1;
        }
    }

    fn input(&mut self, batch: Option<&Batch>) {
        if let Some(batch) = batch {
            self.stats.input_batches += 1;
            self.stats.input_rows += batch.row_count() as u64;
            self.stats.input_size += batch.size() as u64;
        }
    }

    fn output(&mut self, batch: Option<&Batch>) {
        if let Some(batch) = batch {
            self.stats.output_batches += 1;
            self.stats.output_rows += batch.row_count() as u64;
            self.stats.output_size += batch.size() as u64;
        }
    }

    fn reset(&mut self) {
        if self.stats.call_num > 0 {
            debug!(
                operator = %self.name,
                idx = self.node_idx,
                calls = self.stats.call_num,
                input_rows = self.stats.input_rows,
                output_rows = self.stats.output_rows,
                elapsed = ?self.stats.time_consumed,
                "operator execution stats"
            );
        }
        self.started = None;
        self.stats = OperatorStats::default();
    }

    fn stats(&self) -> OperatorStats {
        self.stats.clone()
    }
}
