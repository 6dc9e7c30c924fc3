//! Copy a contiguous row window of one input.

use crate::error::{HoseError, HoseResult};
use crate::execution::Pipeline;
use crate::formats::{RowReader, RowWriter};
use crate::processing::{Limit, Skip};
use crate::types::bound_from_signed;

use super::{RunOptions, RunSummary, execute};

/// Validated `[from, to)` row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Rows to skip.
    pub from: usize,
    /// Rows to keep after skipping. `None` keeps the rest of the stream.
    pub take: Option<usize>,
}

impl Window {
    /// Build a window from command-line style bounds, where `to == -1` means "to the end".
    ///
    /// `from` must be non-negative and `to` must be `-1` or greater than `from`.
    pub fn new(from: i64, to: i64) -> HoseResult<Self> {
        if from < 0 {
            return Err(HoseError::usage(format!(
                "slice start must not be negative, got {from}"
            )));
        }
        if to != -1 && to <= from {
            return Err(HoseError::usage(format!(
                "slice end must be -1 or greater than start {from}, got {to}"
            )));
        }
        let from = from as usize;
        Ok(Self {
            from,
            take: bound_from_signed(to).map(|to| to - from),
        })
    }

    /// Exclusive end row, if bounded.
    pub fn to(&self) -> Option<usize> {
        self.take.map(|take| self.from + take)
    }
}

/// Copy rows `[window.from, window.to)` of `reader` into `writer`.
///
/// The window is applied to input rows ahead of the stages already in `pipeline`. A stream
/// shorter than `window.from` is an error, not an empty result.
pub fn slice<W: RowWriter + ?Sized>(
    reader: Box<dyn RowReader>,
    window: Window,
    mut pipeline: Pipeline,
    writer: &mut W,
    options: &RunOptions,
) -> HoseResult<RunSummary> {
    if let Some(take) = window.take {
        pipeline.prepend(Limit::new(take));
    }
    pipeline.prepend(Skip::new(window.from));
    tracing::debug!(from = window.from, to = ?window.to(), "slicing");

    let summary = execute(vec![reader], pipeline, writer, options)?;
    if summary.complete && summary.rows_read < window.from as u64 {
        return Err(HoseError::SliceStartNotReached {
            from: window.from,
            rows: summary.rows_read as usize,
        });
    }
    Ok(summary)
}
