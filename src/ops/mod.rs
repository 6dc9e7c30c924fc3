//! Orchestration: wire readers, a [`Pipeline`] and a writer into one run.
//!
//! A run has three parts working concurrently:
//!
//! - a source thread feeding every reader's rows, reader by reader, into the pipeline
//! - the pipeline's stage threads
//! - the drain, on the calling thread, writing rows until the pipeline output closes
//!
//! Any part can stop the run: an error or an exhausted quota drops that part's channel ends and
//! the rest shut down in turn. The first error is reported in the order source, stages, drain,
//! flush. Output already written is kept.
//!
//! - [`merge()`]: concatenate N inputs
//! - [`slice()`]: copy the `[from, to)` row window of one input

pub mod merge;
pub mod slice;

use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use serde::Serialize;

use crate::error::{HoseError, HoseResult};
use crate::execution::{Emitter, ExecutionEvent, ExecutionMetrics, Pipeline};
use crate::formats::{RowReader, RowWriter, rows};
use crate::types::{ReadOptions, Row, WriteOptions};

pub use merge::merge;
pub use slice::{Window, slice};

/// Options for one merge or slice run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Applied to every input independently.
    pub read: ReadOptions,
    pub write: WriteOptions,
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub inputs: usize,
    pub rows_read: u64,
    pub rows_written: u64,
    /// Every input was read to its end (the run was not cut short downstream).
    pub complete: bool,
}

/// Feed the rows of `readers` into `tx`, one reader after another.
///
/// Returns the number of rows read and whether every reader was exhausted. Stops early, without
/// error, once `tx` is disconnected.
pub(crate) fn feed(
    readers: Vec<Box<dyn RowReader>>,
    options: ReadOptions,
    tx: Sender<Row>,
    metrics: &ExecutionMetrics,
    emitter: &Emitter,
) -> HoseResult<(u64, bool)> {
    let mut total = 0u64;
    for (source, mut reader) in readers.into_iter().enumerate() {
        let mut read = 0u64;
        let mut disconnected = false;
        for row in rows(&mut reader, options) {
            let row = row?;
            read += 1;
            metrics.on_row_read();
            if tx.send(row).is_err() {
                disconnected = true;
                break;
            }
        }
        total += read;
        emitter.emit(ExecutionEvent::SourceFinished { source, rows: read });
        if disconnected {
            tracing::debug!(source, "downstream closed; stopping input");
            return Ok((total, false));
        }
    }
    Ok((total, true))
}

/// Write every row received on `rx` until it closes or the write quota is reached.
///
/// The header, when enabled, is taken from the first row that carries column names, so it
/// reflects any projection done by the pipeline.
pub(crate) fn drain<W: RowWriter + ?Sized>(
    rx: Receiver<Row>,
    writer: &mut W,
    options: &WriteOptions,
    metrics: &ExecutionMetrics,
) -> HoseResult<u64> {
    let mut written = 0u64;
    let mut header_pending = options.header;
    loop {
        if options
            .max_rows
            .is_some_and(|max| written >= max as u64)
        {
            break;
        }
        let Ok(row) = rx.recv() else {
            break;
        };
        if header_pending {
            header_pending = false;
            if let Some(names) = &row.names {
                writer.init(names)?;
            }
        }
        writer.write_row(&row, options)?;
        written += 1;
        metrics.on_row_written();
    }
    Ok(written)
}

/// Run `readers` through `pipeline` into `writer`.
pub(crate) fn execute<W: RowWriter + ?Sized>(
    readers: Vec<Box<dyn RowReader>>,
    pipeline: Pipeline,
    writer: &mut W,
    options: &RunOptions,
) -> HoseResult<RunSummary> {
    let inputs = readers.len();
    let exec = pipeline.options();
    let metrics = pipeline.metrics();
    let emitter = pipeline.emitter();

    let (src_tx, src_rx) = bounded(exec.source_capacity);
    let (out_tx, out_rx) = bounded(exec.stage_capacity);
    let stages = pipeline.run(src_rx, out_tx)?;

    let source_metrics = std::sync::Arc::clone(&metrics);
    let read = options.read;
    let source = thread::Builder::new()
        .name("hose-source".to_string())
        .spawn(move || feed(readers, read, src_tx, &source_metrics, &emitter))?;

    let drained = drain(out_rx, writer, &options.write, &metrics);
    let flushed = writer.flush();

    let fed = source.join().unwrap_or_else(|_| {
        Err(HoseError::WorkerPanicked {
            worker: "source".to_string(),
        })
    });
    let staged = stages.join();

    let (rows_read, complete) = fed?;
    staged?;
    let rows_written = drained?;
    flushed?;

    Ok(RunSummary {
        inputs,
        rows_read,
        rows_written,
        complete,
    })
}
