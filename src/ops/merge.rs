//! Concatenate several inputs into one output.

use crate::error::{HoseError, HoseResult};
use crate::execution::Pipeline;
use crate::formats::{RowReader, RowWriter};
use crate::types::ColumnNames;

use super::{RunOptions, RunSummary, execute};

/// Merge `readers` into `writer`, running every row through `pipeline`.
///
/// Inputs are read strictly one after another, so the output holds all rows of input 0, then
/// all rows of input 1, and so on. Inputs that carry column names must all agree; this is
/// checked before any row is written.
pub fn merge<W: RowWriter + ?Sized>(
    mut readers: Vec<Box<dyn RowReader>>,
    pipeline: Pipeline,
    writer: &mut W,
    options: &RunOptions,
) -> HoseResult<RunSummary> {
    if readers.is_empty() {
        return Err(HoseError::usage("merge needs at least one input"));
    }
    check_column_names(&mut readers)?;
    tracing::debug!(inputs = readers.len(), stages = pipeline.len(), "merging");
    execute(readers, pipeline, writer, options)
}

fn check_column_names(readers: &mut [Box<dyn RowReader>]) -> HoseResult<()> {
    let mut expected: Option<ColumnNames> = None;
    for (input, reader) in readers.iter_mut().enumerate() {
        let Some(names) = reader.column_names()? else {
            continue;
        };
        match &expected {
            None => expected = Some(names),
            Some(first) if *first == names => {}
            Some(first) => {
                return Err(HoseError::ColumnMismatch {
                    input,
                    expected: first.to_vec(),
                    found: names.to_vec(),
                });
            }
        }
    }
    Ok(())
}
