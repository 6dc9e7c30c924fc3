use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Execution events emitted by the engine and the orchestration layer.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        stages: usize,
    },
    /// One input stream has been fed completely (or feeding stopped early).
    SourceFinished {
        source: usize,
        rows: u64,
    },
    StageStarted {
        stage: usize,
        name: &'static str,
    },
    StageFinished {
        stage: usize,
        name: &'static str,
        rows_in: u64,
        rows_out: u64,
    },
    StageFailed {
        stage: usize,
        name: &'static str,
        error: String,
    },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
///
/// Called from worker threads, possibly concurrently.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { stages } => {
                tracing::info!(stages, "pipeline started");
            }
            ExecutionEvent::SourceFinished { source, rows } => {
                tracing::debug!(source, rows, "input finished");
            }
            ExecutionEvent::StageStarted { stage, name } => {
                tracing::trace!(stage, name, "stage started");
            }
            ExecutionEvent::StageFinished {
                stage,
                name,
                rows_in,
                rows_out,
            } => {
                tracing::debug!(stage, name, rows_in, rows_out, "stage finished");
            }
            ExecutionEvent::StageFailed { stage, name, error } => {
                tracing::error!(stage, name, %error, "stage failed");
            }
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    rows_read = metrics.rows_read,
                    rows_written = metrics.rows_written,
                    rows_dropped = metrics.rows_dropped,
                    "pipeline finished"
                );
            }
        }
    }
}

/// Real-time metrics for an execution run.
///
/// Producers, stages and the drain update these counters as rows move; callers can snapshot
/// them at any time, including from another thread while the run is in progress.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_read: AtomicU64,
    rows_written: AtomicU64,
    rows_dropped: AtomicU64,
    stages_started: AtomicU64,
    stages_finished: AtomicU64,

    active_stages: AtomicUsize,
    max_active_stages: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_read: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            rows_dropped: AtomicU64::new(0),
            stages_started: AtomicU64::new(0),
            stages_finished: AtomicU64::new(0),
            active_stages: AtomicUsize::new(0),
            max_active_stages: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rows_read.store(0, Ordering::SeqCst);
        self.rows_written.store(0, Ordering::SeqCst);
        self.rows_dropped.store(0, Ordering::SeqCst);
        self.stages_started.store(0, Ordering::SeqCst);
        self.stages_finished.store(0, Ordering::SeqCst);
        self.active_stages.store(0, Ordering::SeqCst);
        self.max_active_stages.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_row_read(&self) {
        let _ = self.rows_read.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_row_written(&self) {
        let _ = self.rows_written.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_row_dropped(&self) {
        let _ = self.rows_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_stage_start(&self) {
        let _ = self.stages_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_stages.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_stages, now);
    }

    pub fn on_stage_end(&self) {
        let _ = self.stages_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.active_stages.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns));

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            rows_read: self.rows_read.load(Ordering::SeqCst),
            rows_written: self.rows_written.load(Ordering::SeqCst),
            rows_dropped: self.rows_dropped.load(Ordering::SeqCst),
            stages_started: self.stages_started.load(Ordering::SeqCst),
            stages_finished: self.stages_finished.load(Ordering::SeqCst),
            max_active_stages: self.max_active_stages.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_dropped: u64,
    pub stages_started: u64,
    pub stages_finished: u64,
    pub max_active_stages: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows_read={}, rows_written={}, rows_dropped={}, stages={}/{}, max_active_stages={}, elapsed={:?}",
            self.run_id,
            self.rows_read,
            self.rows_written,
            self.rows_dropped,
            self.stages_finished,
            self.stages_started,
            self.max_active_stages,
            self.elapsed
        )
    }
}
