//! `hose` streams row-oriented datasets (CSV, libSVM, JSON, plain text) through a chain of
//! concurrent transformer stages into an output codec, without loading the data into memory.
//!
//! The two top-level operations are [`ops::merge`] (concatenate N inputs) and [`ops::slice`]
//! (copy a row window of one input). Both take already-opened readers and a writer; resolving
//! paths and extensions is left to the caller (the `hose` binary does it for the command line).
//!
//! ## Formats
//!
//! | name              | read | write | column names           |
//! |-------------------|------|-------|------------------------|
//! | `csv`             | yes  | yes   | first non-blank line   |
//! | `svm` / `libsvm`  | yes  | yes   | none                   |
//! | `json`            | no   | yes   | required to write      |
//! | `txt` / `text`    | yes  | yes   | none                   |
//!
//! ## Row model
//!
//! Every value is kept as a string. A [`types::Row`] is sparse: `schema[i]` is the column of
//! `values[i]`, and a column that is not listed is absent. A blank CSV field and a libSVM
//! feature that is not written are both absent, never an empty string or zero.
//!
//! ## Example: merge two CSV inputs, keeping two columns of matching rows
//!
//! ```rust
//! use hose::execution::{ExecutionOptions, Pipeline};
//! use hose::formats::{CsvReader, CsvWriter, RowReader};
//! use hose::ops::{RunOptions, merge};
//! use hose::processing::{ColumnSelect, Predicate};
//!
//! # fn main() -> Result<(), hose::HoseError> {
//! let inputs: Vec<Box<dyn RowReader>> = vec![
//!     Box::new(CsvReader::new("a,b,c\n1,x,3\n4,y,6\n".as_bytes())),
//!     Box::new(CsvReader::new("a,b,c\n7,x,9\n".as_bytes())),
//! ];
//! let pipeline = Pipeline::new(ExecutionOptions::default())
//!     .with_stage(Predicate::new("b=x")?)
//!     .with_stage(ColumnSelect::new("c,a".parse()?));
//!
//! let mut writer = CsvWriter::new(Vec::new());
//! let summary = merge(inputs, pipeline, &mut writer, &RunOptions::default())?;
//! assert_eq!(summary.rows_written, 2);
//!
//! let out = String::from_utf8(writer.into_inner()?).unwrap();
//! assert_eq!(out, "c,a\n3,1\n9,7\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`formats`]: codecs and the `RowReader` / `RowWriter` capability traits
//! - [`types`]: rows, column names and read/write options
//! - [`processing`]: transformer stages (skip, limit, select, predicate)
//! - [`execution`]: the threaded pipeline engine, metrics and observer hooks
//! - [`ops`]: merge and slice orchestration
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: the error type shared by everything above

pub mod error;
pub mod execution;
pub mod formats;
pub mod logging;
pub mod ops;
pub mod processing;
pub mod types;

pub use error::{ErrorClass, HoseError, HoseResult};
