//! Execution engine: runs a chain of [`Transformer`]s as concurrent stages.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - one named worker thread per stage, connected in series by bounded channels
//! - backpressure through channel capacity (rendezvous hand-off by default)
//! - shutdown by channel closure in both directions
//! - real-time metrics + observer hooks for monitoring
//!
//! Closing works by dropping the sending side of a channel. A stage that runs out of input, hits
//! an error, or becomes exhausted (see [`Transformer::is_exhausted`]) drops both of its
//! channel ends. Downstream stages then see end of input; upstream stages see their next send
//! fail and stop too. A failed send is a normal stop, not an error.

mod observer;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::{HoseError, HoseResult};
use crate::processing::{Identity, Transformer};
use crate::types::Row;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver,
    TracingExecutionObserver,
};

/// Configuration for a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Capacity of the channels between stages. `0` makes every hand-off a rendezvous.
    pub stage_capacity: usize,
    /// Capacity of the channel between the input producer and the first stage.
    pub source_capacity: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            stage_capacity: 0,
            source_capacity: 10_000,
        }
    }
}

/// Cloneable handle for emitting events to the pipeline's observer from any thread.
#[derive(Clone, Default)]
pub(crate) struct Emitter {
    observer: Option<Arc<dyn ExecutionObserver>>,
}

impl Emitter {
    pub(crate) fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Row counts of one finished stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub rows_in: u64,
    pub rows_out: u64,
}

/// An ordered chain of transformers.
pub struct Pipeline {
    stages: Vec<Box<dyn Transformer>>,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl Pipeline {
    pub fn new(opts: ExecutionOptions) -> Self {
        Self {
            stages: Vec::new(),
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Append a stage to the end of the chain.
    pub fn with_stage(mut self, stage: impl Transformer + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Append a stage to the end of the chain.
    pub fn push(&mut self, stage: impl Transformer + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Insert a stage at the front of the chain.
    pub fn prepend(&mut self, stage: impl Transformer + 'static) {
        self.stages.insert(0, Box::new(stage));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of the configured stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn options(&self) -> ExecutionOptions {
        self.opts
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub(crate) fn emitter(&self) -> Emitter {
        Emitter {
            observer: self.observer.clone(),
        }
    }

    /// Launch every stage and return without waiting.
    ///
    /// The first stage consumes `input`; the last stage produces into `output`. An empty chain
    /// gets an [`Identity`] stage. Completion is observed by reading `output` until it closes;
    /// [`PipelineHandle::join`] then reports the first stage error, if any.
    pub fn run(mut self, input: Receiver<Row>, output: Sender<Row>) -> HoseResult<PipelineHandle> {
        if self.stages.is_empty() {
            self.stages.push(Box::new(Identity));
        }
        let started = Instant::now();
        let emitter = self.emitter();
        self.metrics.begin_run();
        emitter.emit(ExecutionEvent::RunStarted {
            stages: self.stages.len(),
        });

        // Stage i reads receivers[i] and writes senders[i].
        let n = self.stages.len();
        let mut receivers = Vec::with_capacity(n);
        let mut senders = Vec::with_capacity(n);
        receivers.push(input);
        for _ in 1..n {
            let (tx, rx) = bounded(self.opts.stage_capacity);
            senders.push(tx);
            receivers.push(rx);
        }
        senders.push(output);

        let mut workers = Vec::with_capacity(n);
        let channels = receivers.into_iter().zip(senders);
        for (index, (stage, (rx, tx))) in self.stages.into_iter().zip(channels).enumerate() {
            let name = stage.name();
            let metrics = Arc::clone(&self.metrics);
            let emitter = emitter.clone();
            let handle = thread::Builder::new()
                .name(format!("hose-{index}-{name}"))
                .spawn(move || run_stage(index, stage, rx, tx, &metrics, &emitter))?;
            workers.push(Worker {
                index,
                name,
                handle,
            });
        }

        Ok(PipelineHandle {
            workers,
            started,
            metrics: self.metrics,
            emitter,
        })
    }
}

fn run_stage(
    index: usize,
    mut stage: Box<dyn Transformer>,
    input: Receiver<Row>,
    output: Sender<Row>,
    metrics: &ExecutionMetrics,
    emitter: &Emitter,
) -> HoseResult<StageStats> {
    let name = stage.name();
    metrics.on_stage_start();
    emitter.emit(ExecutionEvent::StageStarted { stage: index, name });

    let mut stats = StageStats::default();
    let result = loop {
        if stage.is_exhausted() {
            break Ok(());
        }
        let Ok(row) = input.recv() else {
            break Ok(());
        };
        stats.rows_in += 1;
        match stage.apply(row) {
            Ok(Some(row)) => {
                if output.send(row).is_err() {
                    break Ok(());
                }
                stats.rows_out += 1;
            }
            Ok(None) => metrics.on_row_dropped(),
            Err(e) => break Err(e),
        }
    };
    drop(input);
    drop(output);
    metrics.on_stage_end();

    match result {
        Ok(()) => {
            emitter.emit(ExecutionEvent::StageFinished {
                stage: index,
                name,
                rows_in: stats.rows_in,
                rows_out: stats.rows_out,
            });
            Ok(stats)
        }
        Err(e) => {
            emitter.emit(ExecutionEvent::StageFailed {
                stage: index,
                name,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

struct Worker {
    index: usize,
    name: &'static str,
    handle: JoinHandle<HoseResult<StageStats>>,
}

/// Running pipeline. Dropping it detaches the workers.
pub struct PipelineHandle {
    workers: Vec<Worker>,
    started: Instant,
    metrics: Arc<ExecutionMetrics>,
    emitter: Emitter,
}

impl PipelineHandle {
    /// Wait for every stage to finish.
    ///
    /// Returns per-stage stats, or the error of the earliest failing stage in chain order.
    pub fn join(self) -> HoseResult<Vec<StageStats>> {
        let mut stats = Vec::with_capacity(self.workers.len());
        let mut first_err = None;
        for worker in self.workers {
            let outcome = worker.handle.join().unwrap_or_else(|_| {
                Err(HoseError::WorkerPanicked {
                    worker: format!("{}-{}", worker.index, worker.name),
                })
            });
            match outcome {
                Ok(s) => stats.push(s),
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        let elapsed = self.started.elapsed();
        self.metrics.end_run(elapsed);
        self.emitter.emit(ExecutionEvent::RunFinished {
            elapsed,
            metrics: self.metrics.snapshot(),
        });

        match first_err {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionOptions, Pipeline};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::thread;

    use crossbeam_channel::{bounded, unbounded};

    use crate::error::{HoseError, HoseResult};
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::processing::{ColumnSelect, ColumnSpec, Limit, Skip, Transformer};
    use crate::types::{ColumnNames, Row};

    fn numbered(i: usize) -> Row {
        Row::new(vec![0], vec![i.to_string()], None)
    }

    fn run_collect(pipeline: Pipeline, n: usize) -> (Vec<String>, HoseResult<()>) {
        let (in_tx, in_rx) = bounded(4);
        let (out_tx, out_rx) = unbounded();
        let handle = pipeline.run(in_rx, out_tx).unwrap();
        let producer = thread::spawn(move || {
            for i in 0..n {
                if in_tx.send(numbered(i)).is_err() {
                    break;
                }
            }
        });
        let got = out_rx.iter().map(|r| r.values[0].clone()).collect();
        producer.join().unwrap();
        (got, handle.join().map(|_| ()))
    }

    #[test]
    fn empty_pipeline_passes_everything() {
        let (got, res) = run_collect(Pipeline::new(ExecutionOptions::default()), 5);
        res.unwrap();
        assert_eq!(got, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn skip_then_limit_yields_window_in_order() {
        let pipeline = Pipeline::new(ExecutionOptions::default())
            .with_stage(Skip::new(3))
            .with_stage(Limit::new(4));
        let (got, res) = run_collect(pipeline, 20);
        res.unwrap();
        assert_eq!(got, vec!["3", "4", "5", "6"]);
    }

    #[test]
    fn limit_stops_an_endless_producer() {
        let pipeline = Pipeline::new(ExecutionOptions::default())
            .with_stage(Skip::new(1))
            .with_stage(Limit::new(2));
        let (got, res) = run_collect(pipeline, usize::MAX);
        res.unwrap();
        assert_eq!(got, vec!["1", "2"]);
    }

    #[test]
    fn stage_error_aborts_and_closes_output() {
        let pipeline = Pipeline::new(ExecutionOptions::default())
            .with_stage(ColumnSelect::new(ColumnSpec::Names(vec!["a".into()])));
        let (got, res) = run_collect(pipeline, 100);
        assert!(got.is_empty());
        assert!(matches!(res, Err(HoseError::MissingNames)));
    }

    struct Boom;

    impl Transformer for Boom {
        fn name(&self) -> &'static str {
            "boom"
        }

        fn apply(&mut self, _row: Row) -> HoseResult<Option<Row>> {
            panic!("boom");
        }
    }

    #[test]
    fn panicking_stage_is_reported() {
        let pipeline = Pipeline::new(ExecutionOptions::default()).with_stage(Boom);
        let (_, res) = run_collect(pipeline, 3);
        assert!(matches!(res, Err(HoseError::WorkerPanicked { ref worker }) if worker == "0-boom"));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_event(&self, event: &ExecutionEvent) {
            let label = match event {
                ExecutionEvent::RunStarted { .. } => "run_started",
                ExecutionEvent::SourceFinished { .. } => "source_finished",
                ExecutionEvent::StageStarted { .. } => "stage_started",
                ExecutionEvent::StageFinished { .. } => "stage_finished",
                ExecutionEvent::StageFailed { .. } => "stage_failed",
                ExecutionEvent::RunFinished { .. } => "run_finished",
            };
            self.events.lock().unwrap().push(label.to_string());
        }
    }

    #[test]
    fn observer_and_metrics_see_the_run() {
        let recorder = Arc::new(Recorder::default());
        let obs: Arc<dyn ExecutionObserver> = recorder.clone();
        let names = ColumnNames::from_iter(["a", "b"]);
        let pipeline = Pipeline::new(ExecutionOptions {
            stage_capacity: 2,
            source_capacity: 2,
        })
        .with_observer(obs)
        .with_stage(Skip::new(2))
        .with_stage(ColumnSelect::new("b".parse().unwrap()));
        let metrics = pipeline.metrics();
        assert_eq!(pipeline.stage_names(), vec!["skip", "select"]);

        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for i in 0..5 {
            in_tx
                .send(Row::dense(names.clone(), vec![i.to_string(), (i * 10).to_string()]))
                .unwrap();
        }
        drop(in_tx);

        let handle = pipeline.run(in_rx, out_tx).unwrap();
        let got: Vec<Row> = out_rx.iter().collect();
        let stats = handle.join().unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].values, vec!["20"]);
        assert_eq!(stats[0].rows_in, 5);
        assert_eq!(stats[0].rows_out, 3);
        assert_eq!(stats[1].rows_out, 3);

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_dropped, 2);
        assert_eq!(snap.stages_started, 2);
        assert_eq!(snap.stages_finished, 2);
        assert!(snap.elapsed.is_some());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("run_started"));
        assert_eq!(events.last().map(String::as_str), Some("run_finished"));
        assert_eq!(events.iter().filter(|e| *e == "stage_finished").count(), 2);
    }
}
