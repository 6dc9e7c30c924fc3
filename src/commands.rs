//! Command implementations: resolve paths and flags, then hand off to [`hose::ops`].
//!
//! Every flag is validated before the first file is touched, so usage errors never leave
//! partial output behind.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hose::execution::{ExecutionOptions, Pipeline, TracingExecutionObserver};
use hose::formats::{Format, RowReader, RowWriter, reader_for, writer_for};
use hose::ops::{self, RunOptions, RunSummary, Window};
use hose::processing::{ColumnSelect, ColumnSpec, Predicate};
use hose::types::{ReadOptions, WriteOptions};
use hose::{HoseError, HoseResult};
use tracing::{debug, info, info_span};

use crate::cli::{Command, IoArgs, MergeArgs, SliceArgs};

pub fn run(command: &Command) -> HoseResult<()> {
    let (summary, io_args) = match command {
        Command::Merge(args) => (run_merge(args)?, &args.io),
        Command::Slice(args) => (run_slice(args)?, &args.io),
        Command::Convert(_) => return Err(HoseError::NotImplemented { command: "convert" }),
    };
    info!(
        inputs = summary.inputs,
        rows_read = summary.rows_read,
        rows_written = summary.rows_written,
        "done"
    );
    if io_args.summary {
        let mut err = io::stderr().lock();
        serde_json::to_writer(&mut err, &summary)?;
        writeln!(err)?;
    }
    Ok(())
}

pub fn run_merge(args: &MergeArgs) -> HoseResult<RunSummary> {
    let span = info_span!("merge", inputs = args.inputs.len());
    let _guard = span.enter();

    let window = Window::new(args.window.start, args.window.end)?;
    let pipeline = build_pipeline(&args.io)?;
    let out_format = output_format(&args.io)?;
    let paths = expand_inputs(&args.inputs)?;
    let formats = input_formats(&args.io, &paths)?;

    let readers = open_readers(&paths, &formats)?;
    let mut writer = open_writer(args.io.output.as_deref(), out_format)?;
    let options = RunOptions {
        read: ReadOptions {
            skip_rows: window.from,
            max_rows: window.take,
        },
        write: write_options(&args.io),
    };
    ops::merge(readers, pipeline, &mut writer, &options)
}

pub fn run_slice(args: &SliceArgs) -> HoseResult<RunSummary> {
    let span = info_span!("slice", input = %args.input);
    let _guard = span.enter();

    let window = Window::new(args.window.start, args.window.end)?;
    let pipeline = build_pipeline(&args.io)?;
    let out_format = output_format(&args.io)?;
    let paths = expand_inputs(std::slice::from_ref(&args.input))?;
    if paths.len() != 1 {
        return Err(HoseError::usage(format!(
            "slice takes exactly one input, '{}' matched {}",
            args.input,
            paths.len()
        )));
    }
    let formats = input_formats(&args.io, &paths)?;

    let mut readers = open_readers(&paths, &formats)?;
    let Some(reader) = readers.pop() else {
        return Err(HoseError::MissingInput {
            path: args.input.clone(),
        });
    };
    let mut writer = open_writer(args.io.output.as_deref(), out_format)?;
    let options = RunOptions {
        read: ReadOptions::default(),
        write: write_options(&args.io),
    };
    ops::slice(reader, window, pipeline, &mut writer, &options)
}

/// Predicate first, then projection, so predicates may name columns that are not kept.
fn build_pipeline(io: &IoArgs) -> HoseResult<Pipeline> {
    let mut pipeline = Pipeline::new(ExecutionOptions::default())
        .with_observer(Arc::new(TracingExecutionObserver));
    if let Some(expr) = &io.predicate {
        pipeline.push(Predicate::new(expr)?);
    }
    if let Some(columns) = &io.columns {
        pipeline.push(ColumnSelect::new(columns.parse::<ColumnSpec>()?));
    }
    debug!(stages = ?pipeline.stage_names(), "pipeline built");
    Ok(pipeline)
}

fn write_options(io: &IoArgs) -> WriteOptions {
    WriteOptions {
        target_column: io.libsvm_label,
        max_rows: None,
        header: !io.no_header,
    }
}

fn output_format(io: &IoArgs) -> HoseResult<Format> {
    if let Some(name) = &io.to {
        return name.parse();
    }
    match &io.output {
        Some(path) => Format::from_path(path),
        None => Err(HoseError::usage(
            "output format unknown: pass --to when writing to stdout",
        )),
    }
}

fn input_formats(io: &IoArgs, paths: &[PathBuf]) -> HoseResult<Vec<Format>> {
    paths
        .iter()
        .map(|path| {
            let format = match &io.from {
                Some(name) => name.parse()?,
                None => Format::from_path(path)?,
            };
            if !format.can_read() {
                return Err(HoseError::UnsupportedDirection {
                    name: format.name(),
                    direction: "reading",
                });
            }
            Ok(format)
        })
        .collect()
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand input arguments into existing file paths, in argument order.
///
/// Glob patterns expand to their matches in sorted order; a pattern without matches is a
/// missing input, as is a plain path that does not exist.
fn expand_inputs(patterns: &[String]) -> HoseResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if !has_glob_meta(pattern) {
            let path = PathBuf::from(pattern);
            if !path.exists() {
                return Err(HoseError::MissingInput {
                    path: pattern.clone(),
                });
            }
            paths.push(path);
            continue;
        }

        let entries = glob::glob(pattern)
            .map_err(|e| HoseError::usage(format!("invalid glob pattern '{pattern}': {e}")))?;
        let mut matched = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| HoseError::Io(e.into()))?;
            if path.is_file() {
                matched.push(path);
            }
        }
        if matched.is_empty() {
            return Err(HoseError::MissingInput {
                path: pattern.clone(),
            });
        }
        matched.sort();
        debug!(pattern = %pattern, matches = matched.len(), "glob expanded");
        paths.extend(matched);
    }
    Ok(paths)
}

fn open_readers(paths: &[PathBuf], formats: &[Format]) -> HoseResult<Vec<Box<dyn RowReader>>> {
    paths
        .iter()
        .zip(formats)
        .map(|(path, &format)| {
            let file = File::open(path).map_err(|source| HoseError::Open {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), %format, "input opened");
            reader_for(format, BufReader::new(file))
        })
        .collect()
}

fn open_writer(path: Option<&Path>, format: Format) -> HoseResult<Box<dyn RowWriter>> {
    let out: Box<dyn Write> = match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| HoseError::Create {
                path: path.display().to_string(),
                source,
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    writer_for(format, out)
}
