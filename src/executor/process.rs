//! Per-query execution context shared by every operator of a pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use datafusion::execution::memory_pool::{GreedyMemoryPool, UnboundedMemoryPool};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::error::Error;
use crate::types::Value;

use super::vectorized::MemoryPoolRef;
use super::ExecutorConfig;

/// Why a call was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The session canceled the query.
    Canceled,
    /// The query ran past its configured timeout.
    DeadlineExceeded { timeout: Duration },
}

impl CancelReason {
    /// Converts the signal into the error reported to the session.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            CancelReason::Canceled => Error::Canceled,
            CancelReason::DeadlineExceeded { timeout } => Error::QueryTimeout {
                timeout_ms: timeout.as_millis() as u64,
            },
        }
    }
}

/// Externally owned cancellation flag.
///
/// Clones share the same flag, so the session can keep one handle while the
/// pipeline polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Creates a handle that is not canceled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation has been flagged.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Execution context for one query: memory pool, cancellation, parameters.
#[derive(Debug)]
pub struct Process {
    query_id: Uuid,
    config: ExecutorConfig,
    mem_pool: MemoryPoolRef,
    cancel: CancelHandle,
    deadline: Mutex<Option<Instant>>,
    params: RwLock<Vec<Value>>,
}

impl Process {
    /// Creates a context with a pool sized from `config.memory_limit`
    /// (0 = unbounded).
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let pool: MemoryPoolRef = if config.memory_limit == 0 {
            Arc::new(UnboundedMemoryPool::default())
        } else {
            Arc::new(GreedyMemoryPool::new(config.memory_limit))
        };
        Self::with_pool(config, pool)
    }

    /// Creates a context that allocates from an existing shared pool.
    #[must_use]
    pub fn with_pool(config: ExecutorConfig, mem_pool: MemoryPoolRef) -> Self {
        let deadline = config.query_timeout.map(|t| Instant::now() + t);
        Process {
            query_id: Uuid::new_v4(),
            config,
            mem_pool,
            cancel: CancelHandle::new(),
            deadline: Mutex::new(deadline),
            params: RwLock::new(Vec::new()),
        }
    }

    /// Sets the initial bound parameters.
    #[must_use]
    pub fn with_params(self, params: Vec<Value>) -> Self {
        *self.params.write() = params;
        self
    }

    /// Uses an externally owned cancellation handle.
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the query id.
    #[must_use]
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Returns the executor configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Returns the memory pool every allocation goes through.
    #[must_use]
    pub fn mp(&self) -> &MemoryPoolRef {
        &self.mem_pool
    }

    /// Returns a handle that cancels this query.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Flags cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cooperative cancellation check, polled at the top of every call.
    #[must_use]
    pub fn check_cancel(&self) -> Option<CancelReason> {
        if self.cancel.is_canceled() {
            return Some(CancelReason::Canceled);
        }
        let deadline = *self.deadline.lock();
        match (deadline, self.config.query_timeout) {
            (Some(at), Some(timeout)) if Instant::now() >= at => {
                Some(CancelReason::DeadlineExceeded { timeout })
            }
            _ => None,
        }
    }

    /// Restarts the timeout clock for a re-execution.
    pub fn restart_deadline(&self) {
        *self.deadline.lock() = self.config.query_timeout.map(|t| Instant::now() + t);
    }

    /// Returns the bound parameters.
    pub fn params(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.params.read()
    }

    /// Rebinds parameters for the next execution.
    pub fn bind_params(&self, params: Vec<Value>) {
        *self.params.write() = params;
    }
}

impl Default for Process {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
